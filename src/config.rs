use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::request::join_url;

/// Path prefix of every API endpoint
pub const API_PREFIX: &str = "api/v1";

/// UniBro - chat and SOP review from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// UniBro server URL (without /api/v1)
    #[arg(short = 'u', long, env = "UNIBRO_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Path to the token database
    #[arg(short = 'd', long, env = "UNIBRO_TOKEN_DB")]
    pub token_db: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "120")]
    pub http_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in and store credentials
    Login {
        /// Account email or username
        #[arg(short = 'u', long)]
        username: Option<String>,
    },
    /// Create a new account
    Register,
    /// Remove stored credentials
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List chat sessions
    Sessions,
    /// Start a new chat session
    New,
    /// Show the messages of a session
    History {
        session_id: String,
    },
    /// Send one message (to the latest session unless --session is given)
    Send {
        #[arg(short, long)]
        session: Option<String>,
        message: String,
    },
    /// Interactive chat
    Chat {
        session_id: Option<String>,
    },
    /// Upload a statement of purpose (PDF) for review
    Sop {
        file: PathBuf,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    // Server
    pub api_url: String,

    // Token storage
    pub token_db: PathBuf,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Session list cache TTL in seconds
    pub session_cache_ttl: u64,

    pub log_level: String,
    pub log_json: bool,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<(Self, Command)> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let command = args.command.clone();
        Ok((Self::from_args(args)?, command))
    }

    pub fn from_args(args: CliArgs) -> Result<Self> {
        let token_db = match args.token_db {
            Some(path) => expand_tilde(&path),
            None => default_token_db().context(
                "Cannot determine a config directory; set UNIBRO_TOKEN_DB or pass -d",
            )?,
        };

        Ok(Config {
            api_url: args.api_url.trim_end_matches('/').to_string(),
            token_db,

            http_connect_timeout: env_or("HTTP_CONNECT_TIMEOUT", 10),
            http_request_timeout: args.http_timeout,

            session_cache_ttl: env_or("SESSION_CACHE_TTL", 300),

            log_level: args.log_level,
            log_json: args.log_json,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            anyhow::bail!(
                "UNIBRO_API_URL must start with http:// or https://, got: {}",
                self.api_url
            );
        }

        if self.http_connect_timeout == 0 || self.http_request_timeout == 0 {
            anyhow::bail!("HTTP timeouts must be greater than zero");
        }

        Ok(())
    }

    /// Base URL all endpoint paths are joined onto
    pub fn api_base_url(&self) -> String {
        join_url(&self.api_url, API_PREFIX)
    }
}

fn env_or(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// ~/.config/unibro/tokens.sqlite3 (platform config dir)
fn default_token_db() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("unibro").join("tokens.sqlite3"))
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str) -> Config {
        Config {
            api_url: api_url.to_string(),
            token_db: PathBuf::from("/tmp/tokens.sqlite3"),
            http_connect_timeout: 10,
            http_request_timeout: 120,
            session_cache_ttl: 300,
            log_level: "warn".to_string(),
            log_json: false,
        }
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/file.txt");
        assert!(path.to_string_lossy().contains("test/file.txt"));
        assert!(!path.to_string_lossy().starts_with("~"));

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_tilde_just_tilde() {
        // Just "~" without slash should not expand
        let path = expand_tilde("~");
        assert_eq!(path, PathBuf::from("~"));
    }

    #[test]
    fn test_api_base_url() {
        assert_eq!(
            config("http://localhost:8000").api_base_url(),
            "http://localhost:8000/api/v1"
        );
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        assert!(config("localhost:8000").validate().is_err());
        assert!(config("https://unibro.example").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut cfg = config("http://localhost:8000");
        cfg.http_request_timeout = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_args_trims_trailing_slash() {
        let args = CliArgs::parse_from([
            "unibro",
            "-u",
            "http://localhost:8000/",
            "-d",
            "/tmp/t.sqlite3",
            "sessions",
        ]);
        assert_eq!(args.command, Command::Sessions);

        let cfg = Config::from_args(args).unwrap();
        assert_eq!(cfg.api_url, "http://localhost:8000");
        assert_eq!(cfg.token_db, PathBuf::from("/tmp/t.sqlite3"));
    }

    #[test]
    fn test_parse_send_command() {
        let args = CliArgs::parse_from(["unibro", "send", "-s", "abc", "hello there"]);
        assert_eq!(
            args.command,
            Command::Send {
                session: Some("abc".to_string()),
                message: "hello there".to_string(),
            }
        );
    }
}
