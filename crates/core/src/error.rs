use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown {kind} '{value}'")]
    UnknownOption { kind: &'static str, value: String },

    #[error("conflicting arguments: {0}")]
    Conflict(String),

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("column '{column}' cannot be used as numeric: '{value}' is not a number")]
    NotNumeric { column: String, value: String },

    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("shape error: {0}")]
    Shape(String),

    #[error("at least {needed} samples are required, got {got}")]
    TooFewSamples { needed: usize, got: usize },

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("render error: {0}")]
    Render(String),

    #[error("smoothing failed: {0}")]
    Smoothing(String),
}

impl Error {
    pub(crate) fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        Error::UnknownOption {
            kind,
            value: value.into(),
        }
    }
}

impl<E> From<DrawingAreaErrorKind<E>> for Error
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Error::Render(err.to_string())
    }
}

/// Parses a `strum` option enum, reporting unknown names as [`Error::UnknownOption`].
pub fn parse_option<T>(kind: &'static str, value: &str) -> Result<T>
where
    T: std::str::FromStr<Err = strum::ParseError>,
{
    value.trim().parse::<T>().map_err(|_| Error::unknown(kind, value))
}
