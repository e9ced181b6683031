//! API error normalisation

use reqwest::StatusCode;
use thiserror::Error;

use tracker_auth::VerifyError;

/// A failed request reduced to what the UI shows: a human-readable message
/// plus the HTTP status when one exists.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status_code: Option<u16>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
        }
    }

    /// Best message a failed response can yield: the server's JSON
    /// `{message}` field, then a bare JSON string body, then the raw body
    /// text, then the status code itself.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("Request failed with status {}", status.as_u16())
            } else {
                trimmed.to_string()
            }
        });

        Self {
            message,
            status_code: Some(status.as_u16()),
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Object(map) => match map.get("message") {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        },
        _ => None,
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            message: e.to_string(),
            status_code: e.status().map(|s| s.as_u16()),
        }
    }
}

impl From<ApiError> for VerifyError {
    fn from(e: ApiError) -> Self {
        VerifyError {
            message: e.message,
            status_code: e.status_code,
        }
    }
}
