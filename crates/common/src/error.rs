use thiserror::Error;

use crate::Field;

#[derive(Debug, Error)]
pub enum Error {
    /// A label or minute count that is not in the interval catalog.
    #[error("Unknown interval: {0}")]
    UnknownInterval(String),

    /// Non-positive interval, or a resample that is not coarser than the source.
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// Too few rows, unsorted dates, mismatched lengths or colliding columns.
    #[error("Incompatible series: {0}")]
    IncompatibleSeries(String),

    #[error("Missing field: {0}")]
    MissingField(Field),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
