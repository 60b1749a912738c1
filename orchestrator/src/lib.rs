pub mod configs;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod online;
pub mod report;
pub mod round;

pub use dispatch::{DispatchOptions, Dispatcher};
pub use error::{OrchestratorError, Result};
pub use ledger::{PredictionLedger, SeriesPair};
pub use metrics::ErrorMetrics;
pub use online::{OnlineOrchestrator, OnlineRoundReport, RollingCursor};
pub use report::Reporter;
pub use round::{RoundLoss, RoundOrchestrator, RoundState};
