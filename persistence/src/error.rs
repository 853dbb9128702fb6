//! FILENAME: persistence/src/error.rs

use thiserror::Error;
use pivot_data::PivotError;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No {0} generation for cache group")]
    MissingGeneration(&'static str),

    #[error("Invalid page key: {0}")]
    InvalidPageKey(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),
}

impl From<PersistenceError> for PivotError {
    fn from(err: PersistenceError) -> Self {
        PivotError::Cache(err.to_string())
    }
}
