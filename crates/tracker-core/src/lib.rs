//! Tracker Client Core
//!
//! Central coordination layer for the task-tracking dashboard client. One
//! `Tracker` wires storage, the session lifecycle, and the API client
//! together and is passed down explicitly to every view that needs it;
//! there is no ambient global instance.

mod config;
mod error;
mod theme;
mod tracker;

pub use config::Config;
pub use error::CoreError;
pub use theme::{Theme, THEME_KEY};
pub use tracker::Tracker;

// Re-export core components
pub use tracker_api::{
    ApiClient, ApiError, ApiMessage, AuthSuccess, Department, DepartmentPayload,
    ForgotPasswordPayload, SignInPayload, SignUpPayload,
};
pub use tracker_auth::{
    cancel_scope, AuthUser, CancelHandle, CancelToken, Session, SessionManager, SessionNotice,
    SessionPhase, TokenVerifier, VerifyError, VerifyOutcome,
};
pub use tracker_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
