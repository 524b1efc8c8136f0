//! Configuration module for noticeboard.

use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;

use crate::{BoardError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Timezone used to display comment timestamps and to interpret
    /// naive timestamps sent by polling clients (e.g., "Asia/Tokyo", "UTC").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timezone: default_timezone(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/noticeboard.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_max_age")]
    pub max_age_secs: u64,
    /// Whether the cookie is marked `Secure` (HTTPS only).
    #[serde(default)]
    pub secure: bool,
}

fn default_cookie_name() -> String {
    "sessionid".to_string()
}

fn default_session_max_age() -> u64 {
    14 * 24 * 60 * 60 // two weeks
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            max_age_secs: default_session_max_age(),
            secure: false,
        }
    }
}

/// Rate limits for credential-checking endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Login attempts per minute per client IP.
    #[serde(default = "default_login_rate_limit")]
    pub login_per_minute: u32,
    /// Thread unlock attempts per minute per client IP.
    #[serde(default = "default_unlock_rate_limit")]
    pub unlock_per_minute: u32,
    /// Take the client IP from `X-Forwarded-For` / `X-Real-IP`.
    /// Only enable behind a reverse proxy that sets these headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

fn default_login_rate_limit() -> u32 {
    10
}

fn default_unlock_rate_limit() -> u32 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_per_minute: default_login_rate_limit(),
            unlock_per_minute: default_unlock_rate_limit(),
            trust_proxy_headers: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/noticeboard.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Rate limit configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(BoardError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BoardError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `NOTICEBOARD_DATABASE_PATH`: Override the database path
    /// - `NOTICEBOARD_PORT`: Override the listen port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("NOTICEBOARD_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(port) = std::env::var("NOTICEBOARD_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid NOTICEBOARD_PORT value: {}", port),
            }
        }
    }

    /// Parsed server timezone.
    pub fn timezone(&self) -> Result<Tz> {
        self.server
            .timezone
            .parse()
            .map_err(|_| BoardError::Config(format!("unknown timezone: {}", self.server.timezone)))
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the timezone is not a known IANA name
    /// - the session cookie name is empty
    /// - the session lifetime is zero
    pub fn validate(&self) -> Result<()> {
        self.timezone()?;
        if self.session.cookie_name.is_empty() {
            return Err(BoardError::Config(
                "session.cookie_name must not be empty".to_string(),
            ));
        }
        if self.session.max_age_secs == 0 {
            return Err(BoardError::Config(
                "session.max_age_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
