use std::{error::Error, fmt, io, path::PathBuf};

use machine_learning::MlErr;

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Local training and partition loading failures.
#[derive(Debug)]
pub enum WorkerErr {
    Io(io::Error),
    Csv(csv::Error),
    NoPartitions {
        dir: PathBuf,
    },
    MissingColumn {
        path: PathBuf,
        column: String,
    },
    InvalidValue {
        path: PathBuf,
        line: u64,
        value: String,
    },
    EmptySeries {
        partition: String,
    },
    InvalidSplit(String),
    InsufficientData {
        partition: String,
        needed: usize,
        available: usize,
    },
    InvalidForecast {
        actual: usize,
        predicted: usize,
    },
    Model(MlErr),
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::Io(e) => write!(f, "io error: {e}"),
            WorkerErr::Csv(e) => write!(f, "csv error: {e}"),
            WorkerErr::NoPartitions { dir } => {
                write!(f, "no partition files found in {}", dir.display())
            }
            WorkerErr::MissingColumn { path, column } => {
                write!(f, "{} has no column named {column}", path.display())
            }
            WorkerErr::InvalidValue { path, line, value } => write!(
                f,
                "{} line {line}: {value:?} is not a number",
                path.display()
            ),
            WorkerErr::EmptySeries { partition } => {
                write!(f, "partition {partition} has an empty series")
            }
            WorkerErr::InvalidSplit(detail) => write!(f, "invalid train/test split: {detail}"),
            WorkerErr::InsufficientData {
                partition,
                needed,
                available,
            } => write!(
                f,
                "partition {partition} needs {needed} held out values, only has {available}"
            ),
            WorkerErr::InvalidForecast { actual, predicted } => write!(
                f,
                "forecast has {actual} actual values but {predicted} predictions"
            ),
            WorkerErr::Model(e) => write!(f, "model error: {e}"),
        }
    }
}

impl Error for WorkerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerErr::Io(e) => Some(e),
            WorkerErr::Csv(e) => Some(e),
            WorkerErr::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WorkerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for WorkerErr {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<MlErr> for WorkerErr {
    fn from(value: MlErr) -> Self {
        Self::Model(value)
    }
}
