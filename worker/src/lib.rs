pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod series;
pub mod trainer;

pub use config::WorkerConfig;
pub use context::ExecContext;
pub use error::{Result, WorkerErr};
pub use series::SeriesTrainer;
pub use trainer::{Forecast, LocalTrainer, LocalUpdate, OnlineUpdate};
