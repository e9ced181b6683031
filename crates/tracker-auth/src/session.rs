//! Session data structures

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
}

/// An authenticated session: a bearer token and the profile it was issued
/// for. A token without a user (or the reverse) is not representable;
/// anything short of this pair counts as logged out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: AuthUser,
}

/// Where the session lifecycle currently stands.
///
/// `Unknown` covers the window between process start and the first
/// verification result; a restored candidate session may render during it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unknown,
    Unauthenticated,
    Authenticated,
}

/// Transient user-facing message, e.g. a session-expiry toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionNotice {
    pub message: String,
}
