pub mod aggregation;
pub mod error;
pub mod selection;
pub mod storage;

pub use aggregation::{Aggregator, FedAvg};
pub use error::{Result, ServerErr};
pub use selection::{ParticipantSelector, Selection};
pub use storage::GlobalModel;
