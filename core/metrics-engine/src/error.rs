//! FILENAME: core/metrics-engine/src/error.rs

use thiserror::Error;

/// Configuration errors. Aggregation itself never fails.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid pivot definition: {0}")]
    Definition(#[from] serde_json::Error),

    #[error("Unknown metric id: {0}")]
    UnknownMetric(String),
}
