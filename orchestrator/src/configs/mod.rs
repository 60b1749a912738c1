mod adapter;
mod data;
mod execution;
mod federation;
mod model;

pub use adapter::Adapter;
pub use data::DataConfig;
pub use execution::{ExecutionConfig, FailurePolicy};
pub use federation::{DEFAULT_ONLINE_TEST_LEN, FederationConfig, RunMode};
pub use model::{InitConfig, ModelConfig};
