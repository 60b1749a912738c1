pub mod activations;
mod forecaster;
pub mod layers;
pub mod loss;
mod model;
mod sequential;

pub use forecaster::ForecasterSpec;
pub use model::Model;
pub use sequential::Sequential;
