use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid submission: {0}")]
    Invalid(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog is locked by another writer ({}); remove it if no writer is running", .0.display())]
    Locked(PathBuf),

    #[error("{0}")]
    Other(String),
}
