pub mod checkpoint;
mod global;

pub use global::GlobalModel;
