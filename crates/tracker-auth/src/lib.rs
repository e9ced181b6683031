//! Tracker Session Management
//!
//! Owns the authenticated-session state (bearer token + user profile),
//! persists it to the settings store, and reconciles it against the remote
//! verification endpoint on startup. One `SessionManager` is constructed at
//! application start and handed to consumers explicitly; consumers read
//! through it and never mutate session state directly.

mod cancel;
mod error;
mod manager;
mod record;
mod session;
mod verify;

pub use cancel::{cancel_scope, CancelHandle, CancelToken};
pub use error::AuthError;
pub use manager::SessionManager;
pub use record::{stored_token, AUTH_STATE_KEY, LEGACY_TOKEN_KEY};
pub use session::{AuthUser, Session, SessionNotice, SessionPhase};
pub use verify::{TokenVerifier, VerifyError, VerifyOutcome};

pub type Result<T> = std::result::Result<T, AuthError>;
