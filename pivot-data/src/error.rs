//! FILENAME: pivot-data/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PivotError {
    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Cache target error: {0}")]
    Cache(String),

    #[error("Invalid entity index {0:?}: must not contain the cache key delimiter")]
    InvalidEntityIndex(String),

    #[error("Field {field} refers to unknown handler {handler}")]
    UnknownHandler { field: String, handler: String },

    #[error("Invalid rebuild limits: {0}")]
    InvalidLimits(String),

    #[error("Cursor was produced for different rebuild params")]
    StaleCursor,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result type shared by every collaborator contract.
pub type Result<T> = std::result::Result<T, PivotError>;
