// Error handling module
// Defines the client error taxonomy and HTTP error body decoding

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced to callers of the API client
#[derive(Error, Debug)]
pub enum ApiError {
    /// A 401 that could not be recovered by a token refresh
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authentication could not be attempted (e.g. no refresh token stored)
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// The refresh endpoint rejected the refresh token or was unreachable
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// Network-level failure, never retried
    #[error("Transport error: {0}")]
    Transport(String),

    /// Any other non-success HTTP response
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Client-side input validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error (token store I/O, malformed payloads)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Build an error from a non-success status and its raw body
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = extract_detail(body);
        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized(message)
        } else {
            ApiError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }

    /// Categorize a reqwest failure
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connection_failed"
        } else if err.is_request() {
            "request_error"
        } else if err.is_body() {
            "body_error"
        } else if err.is_decode() {
            "decode_error"
        } else {
            "unknown"
        };
        ApiError::Transport(format!("{} (kind: {})", err, kind))
    }

    /// Whether this error means the user has to log in again
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized(_) | ApiError::AuthError(_) | ApiError::RefreshFailed(_)
        )
    }
}

/// Pull a human readable message out of an error body.
///
/// The API answers with `{"detail": "..."}` for HTTP errors; validation
/// failures use `{"detail": [{"msg": "..."}]}`. Anything else is returned as-is.
pub fn extract_detail(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    match json.get("detail") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => body.trim().to_string(),
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
