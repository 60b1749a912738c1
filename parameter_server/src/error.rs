use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The parameter server's result type.
pub type Result<T> = std::result::Result<T, ServerErr>;

/// Failures while selecting participants, aggregating their parameters or
/// persisting the global model.
#[derive(Debug)]
pub enum ServerErr {
    EmptyPartitionSet,
    NoParticipants,
    InvalidFraction(f64),
    TooManyParticipants {
        requested: usize,
        available: usize,
    },
    EmptyAggregation,
    KeyMismatch {
        key: String,
        entry: usize,
    },
    ShapeMismatch {
        key: String,
        entry: usize,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    LayoutChanged,
    Checkpoint(String),
    Io(io::Error),
}

impl ServerErr {
    /// Whether this error comes from an invalid participant configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyPartitionSet
                | Self::NoParticipants
                | Self::InvalidFraction(_)
                | Self::TooManyParticipants { .. }
        )
    }
}

impl Display for ServerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPartitionSet => write!(f, "there are no partitions to select from"),
            Self::NoParticipants => write!(f, "the participant count must be at least 1"),
            Self::InvalidFraction(frac) => {
                write!(f, "the participant fraction must be in (0, 1], got {frac}")
            }
            Self::TooManyParticipants {
                requested,
                available,
            } => write!(
                f,
                "requested {requested} participants but only {available} partitions exist"
            ),
            Self::EmptyAggregation => write!(f, "tried to aggregate an empty list of parameters"),
            Self::KeyMismatch { key, entry } => write!(
                f,
                "parameter set {entry} doesn't match the first one on key {key}"
            ),
            Self::ShapeMismatch {
                key,
                entry,
                got,
                expected,
            } => write!(
                f,
                "parameter set {entry} has shape {got:?} for {key}, expected {expected:?}"
            ),
            Self::LayoutChanged => {
                write!(f, "the new global parameters don't match the current layout")
            }
            Self::Checkpoint(detail) => write!(f, "checkpoint error: {detail}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for ServerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ServerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
