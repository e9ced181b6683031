//! Tracker Storage Layer
//!
//! SQLite-backed key/value storage for client state that must survive
//! process restarts: the persisted session record and user preferences.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
