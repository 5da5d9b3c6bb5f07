// Authentication types

use serde::{Deserialize, Serialize};

/// Token store key for the bearer credential
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Token store key for the refresh credential
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Path of the refresh endpoint, relative to the API base
pub const REFRESH_PATH: &str = "/users/refresh";

/// Access/refresh pair as held in the token store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Refresh request body
#[derive(Debug, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh response body
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    /// Sent by some deployments; the client does not rotate it
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Login response body
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub token_type: Option<String>,
}

/// Shorten a token for log output
pub fn token_preview(token: &str) -> String {
    format!("{}...", token.chars().take(8).collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("abcdefghijkl"), "abcdefgh...");
        assert_eq!(token_preview("abc"), "abc...");
    }

    #[test]
    fn test_token_preview_multibyte() {
        assert_eq!(token_preview("abcdefgé12"), "abcdefgé...");
        assert_eq!(token_preview("ééééééééé"), "éééééééé...");
    }

    #[test]
    fn test_login_response_without_refresh_token() {
        let resp: LoginResponse =
            serde_json::from_str(r#"{"access_token":"A1","token_type":"bearer"}"#).unwrap();
        assert_eq!(resp.access_token, "A1");
        assert!(resp.refresh_token.is_none());
    }
}
