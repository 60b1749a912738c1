use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    MissingParam {
        name: String,
    },
    ShapeMismatch {
        name: String,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    WindowTooLarge {
        window: usize,
        len: usize,
    },
    EmptyDataset,
    InvalidInit(String),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => format!("There's a size mismatch in {what}, got {got} and expected {expected}"),
            MlErr::MissingParam { name } => {
                format!("The parameter set has no entry named {name}")
            }
            MlErr::ShapeMismatch {
                name,
                got,
                expected,
            } => format!("The parameter {name} has shape {got:?} but {expected:?} was expected"),
            MlErr::WindowTooLarge { window, len } => format!(
                "A window of {window} values doesn't fit in a series of {len} values"
            ),
            MlErr::EmptyDataset => "Tried to train on an empty dataset".to_string(),
            MlErr::InvalidInit(detail) => format!("Invalid parameter initializer: {detail}"),
        };

        write!(f, "{s}")
    }
}

impl Error for MlErr {}
