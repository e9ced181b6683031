//! Auth error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Storage error: {0}")]
    Storage(#[from] tracker_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
