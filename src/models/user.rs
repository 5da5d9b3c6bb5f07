// Account models

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum password length accepted by the registration endpoint
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub username: String,
    pub email: String,
}

/// Body of POST /auth/register
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterRequest {
    /// Check the form before it goes over the wire
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("Username is required".to_string());
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(format!("Invalid email address: {}", self.email));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            ));
        }
        if self.password != self.confirm_password {
            return Err("Passwords do not match".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegisterRequest {
        RegisterRequest {
            username: "ana".to_string(),
            email: "ana@example.edu".to_string(),
            password: "correct-horse".to_string(),
            confirm_password: "correct-horse".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_email() {
        let mut req = form();
        req.email = "ana.example.edu".to_string();
        assert!(req.validate().unwrap_err().contains("email"));
    }

    #[test]
    fn test_rejects_short_password() {
        let mut req = form();
        req.password = "short".to_string();
        req.confirm_password = "short".to_string();
        assert!(req.validate().unwrap_err().contains("at least 8"));
    }

    #[test]
    fn test_rejects_mismatched_confirmation() {
        let mut req = form();
        req.confirm_password = "correct-horsf".to_string();
        assert_eq!(req.validate().unwrap_err(), "Passwords do not match");
    }

    #[test]
    fn test_rejects_blank_username() {
        let mut req = form();
        req.username = "  ".to_string();
        assert_eq!(req.validate().unwrap_err(), "Username is required");
    }
}
