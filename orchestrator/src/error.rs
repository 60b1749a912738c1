use std::{fmt, io, time::Duration};

use parameter_server::ServerErr;
use tokio::task::JoinError;
use worker::WorkerErr;

/// The orchestrator's result type.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// All errors that can occur in the orchestrator.
#[derive(Debug)]
pub enum OrchestratorError {
    /// Invalid configuration, caught before the first round.
    InvalidConfig(String),
    /// A round ended up without a single participant to aggregate.
    EmptySelection { round: usize },
    /// Selection, aggregation or checkpointing failed.
    Server(ServerErr),
    /// Loading the partitions failed.
    Worker(WorkerErr),
    /// A participant failed its local step.
    Participant { partition: String, source: WorkerErr },
    /// A participant didn't finish its local step in time.
    Timeout { partition: String, after: Duration },
    /// A participant's task panicked or was cancelled.
    Join(JoinError),
    Json(serde_json::Error),
    Csv(csv::Error),
    Io(io::Error),
}

impl OrchestratorError {
    /// Whether this error comes from the configuration rather than the run itself.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::InvalidConfig(_) => true,
            Self::Server(e) => e.is_configuration(),
            _ => false,
        }
    }
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::EmptySelection { round } => {
                write!(f, "round {round} has no participants left to aggregate")
            }
            Self::Server(e) => write!(f, "server error: {e}"),
            Self::Worker(e) => write!(f, "worker error: {e}"),
            Self::Participant { partition, source } => {
                write!(f, "participant {partition} failed: {source}")
            }
            Self::Timeout { partition, after } => {
                write!(f, "participant {partition} timed out after {after:?}")
            }
            Self::Join(e) => write!(f, "participant task failed: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::Csv(e) => write!(f, "csv error: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Server(e) => Some(e),
            Self::Worker(e) => Some(e),
            Self::Participant { source, .. } => Some(source),
            Self::Join(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Csv(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ServerErr> for OrchestratorError {
    fn from(e: ServerErr) -> Self {
        Self::Server(e)
    }
}

impl From<WorkerErr> for OrchestratorError {
    fn from(e: WorkerErr) -> Self {
        Self::Worker(e)
    }
}

impl From<JoinError> for OrchestratorError {
    fn from(e: JoinError) -> Self {
        Self::Join(e)
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<csv::Error> for OrchestratorError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<io::Error> for OrchestratorError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
