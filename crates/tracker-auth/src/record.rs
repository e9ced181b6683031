//! Persisted session record
//!
//! The record is JSON stored under one well-known settings key: a full
//! `{token, user}` pair or nothing. Anything that fails to parse back into
//! that shape is treated as absent, so a corrupt record degrades to a clean
//! logged-out start instead of an error.

use serde::Deserialize;
use tracker_storage::Database;

use crate::session::Session;
use crate::Result;

/// Primary storage key holding the serialized `{token, user}` record.
pub const AUTH_STATE_KEY: &str = "tracker-auth-state";

/// Storage key from the pre-record persistence scheme, holding a bare token
/// string. Read-only; consulted only when the primary key is absent.
pub const LEGACY_TOKEN_KEY: &str = "access_token";

pub(crate) fn load(db: &Database) -> Option<Session> {
    let raw = match db.get_setting(AUTH_STATE_KEY) {
        Ok(value) => value?,
        Err(e) => {
            tracing::warn!("Failed to read stored auth state: {}", e);
            return None;
        }
    };

    match serde_json::from_str::<Session>(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!("Discarding malformed auth record: {}", e);
            None
        }
    }
}

pub(crate) fn store(db: &Database, session: &Session) -> Result<()> {
    let serialized = serde_json::to_string(session)?;
    db.set_setting(AUTH_STATE_KEY, &serialized)?;
    Ok(())
}

pub(crate) fn remove(db: &Database) -> Result<()> {
    db.delete_setting(AUTH_STATE_KEY)?;
    Ok(())
}

#[derive(Deserialize)]
struct RecordToken {
    token: Option<String>,
}

/// Token available for verification: the primary record's token field when
/// the record parses, otherwise the legacy bare-token key. A record that
/// exists but is malformed yields nothing; the legacy key is not consulted
/// behind it.
pub fn stored_token(db: &Database) -> Option<String> {
    match db.get_setting(AUTH_STATE_KEY) {
        Ok(Some(raw)) => match serde_json::from_str::<RecordToken>(&raw) {
            Ok(RecordToken { token: Some(token) }) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Failed to parse stored auth state: {}", e);
                None
            }
        },
        Ok(None) => match db.get_setting(LEGACY_TOKEN_KEY) {
            Ok(value) => value.filter(|token| !token.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read legacy token: {}", e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read stored auth state: {}", e);
            None
        }
    }
}
