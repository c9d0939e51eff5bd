use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = BatchError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BatchError {
    /// Paired columns of unequal length; raised before any backend call
    #[error("shape mismatch: {left} prompts but {right} executions")]
    ShapeMismatch { left: usize, right: usize },
    #[error("missing column {0:?}")]
    MissingColumn(String),
    #[error("table {path}: {reason}")]
    Table { path: PathBuf, reason: String },
    #[error("malformed table: {0}")]
    Malformed(String),
    #[error("metrics error: {0}")]
    Metrics(String),
    #[error("worker task failed: {0}")]
    Task(String),
}
