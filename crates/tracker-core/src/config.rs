//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the dashboard API
    pub base_url: String,
    /// Path to the database file
    pub database_path: PathBuf,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            database_path: data_dir.join("tracker.db"),
            request_timeout_secs: 10,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn data_dir() -> PathBuf {
        platform_data_dir()
            .map(|d| d.join("Tracker"))
            .unwrap_or_else(|| PathBuf::from(".tracker"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

fn platform_data_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        return std::env::var_os("LOCALAPPDATA").map(PathBuf::from);
    }
    if cfg!(target_os = "macos") {
        return home_dir().map(|h| h.join("Library").join("Application Support"));
    }

    // Linux and friends: honour XDG, else fall back under $HOME
    std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|h| h.join(".local").join("share")))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
