//! FILENAME: core/records/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordsError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON array of record objects")]
    NotAnArray,

    #[error("Invalid field mapping: {0}")]
    InvalidMapping(String),
}
