//! Remote token verification seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::AuthUser;

/// Answer from the remote authority about a held token. The server may
/// omit the refreshed token or the profile; the session manager decides
/// what each combination means.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub valid: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// Failure reported by the verification transport: a human-readable
/// message plus the HTTP status where one exists.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct VerifyError {
    pub message: String,
    pub status_code: Option<u16>,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<VerifyOutcome, VerifyError>;
}
