//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] tracker_storage::StorageError),

    #[error("API error: {0}")]
    Api(#[from] tracker_api::ApiError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}
