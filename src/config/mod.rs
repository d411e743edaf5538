//! Application configuration
//!
//! Loaded in layers: built-in defaults, then an optional TOML file, then
//! `TALENTDECK_*` environment variables. The result is validated once, before
//! the server or any CLI command touches storage.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{ErrorCode, MarketError, Result};
use crate::storage::{BackendType, StorageConfig};

/// Valid log levels for configuration validation.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Environment variable naming the config file when `--config` is absent
pub const CONFIG_ENV_VAR: &str = "TALENTDECK_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Externally reachable base URL, used to build invite links
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Origins allowed by CORS; empty allows none beyond same-origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            public_url: default_public_url(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            MarketError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("server.listen '{}' is not a socket address: {}", self.listen, e),
            )
        })
    }

    /// Public URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(with = "humantime_serde", default = "default_session_ttl")]
    pub session_ttl: Duration,

    #[serde(with = "humantime_serde", default = "default_invite_ttl")]
    pub invite_ttl: Duration,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Add `Secure` to the session cookie; enable behind HTTPS
    #[serde(default)]
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: default_session_ttl(),
            invite_ttl: default_invite_ttl(),
            cookie_name: default_cookie_name(),
            cookie_secure: false,
        }
    }
}

impl AuthConfig {
    pub fn session_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.session_ttl).unwrap_or(chrono::Duration::hours(12))
    }

    pub fn invite_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.invite_ttl).unwrap_or(chrono::Duration::days(7))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level, used when neither `-v` nor `RUST_LOG` is given
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// Default value functions for serde
fn default_listen() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

const MIN_TTL: Duration = Duration::from_secs(60);
const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn default_session_ttl() -> Duration {
    Duration::from_secs(12 * 60 * 60)
}

fn default_invite_ttl() -> Duration {
    Duration::from_secs(7 * 24 * 60 * 60)
}

fn default_cookie_name() -> String {
    "td_session".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_ENV_VAR).ok();
        let path = path.or(from_env.as_deref().map(Path::new));

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.merge_env_vars();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            MarketError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                format!("cannot read {}", path.display()),
            )
            .with_source(e)
        })?;
        Self::from_toml(&content).map_err(|e| e.with_context(path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `TALENTDECK_*` overrides from the process environment
    pub fn merge_env_vars(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup, so tests need not touch the
    /// process environment
    pub fn merge_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(listen) = lookup("TALENTDECK_LISTEN") {
            self.server.listen = listen;
        }

        if let Some(url) = lookup("TALENTDECK_PUBLIC_URL") {
            self.server.public_url = url;
        }

        if let Some(backend) = lookup("TALENTDECK_STORAGE") {
            match backend.parse::<BackendType>() {
                Ok(backend) => self.storage.backend = backend,
                Err(e) => debug!("Ignoring TALENTDECK_STORAGE: {}", e),
            }
        }

        if let Some(url) = lookup("TALENTDECK_DATABASE_URL") {
            self.storage.postgres.connection_string = url;
        } else if let Some(url) = lookup("DATABASE_URL") {
            if self.storage.postgres.connection_string.is_empty() {
                self.storage.postgres.connection_string = url;
            }
        }

        if let Some(level) = lookup("TALENTDECK_LOG") {
            self.logging.level = level;
        }

        if let Some(secure) = lookup("TALENTDECK_COOKIE_SECURE") {
            if let Ok(value) = secure.parse::<bool>() {
                self.auth.cookie_secure = value;
            }
        }
    }

    /// Check every setting, reporting all problems at once
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.server.listen.parse::<SocketAddr>().is_err() {
            problems.push(format!("server.listen '{}' is not a socket address", self.server.listen));
        }

        match url::Url::parse(&self.server.public_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => problems.push(format!(
                "server.public_url '{}' must be an http(s) URL",
                self.server.public_url
            )),
        }

        for (key, ttl) in [
            ("auth.session_ttl", self.auth.session_ttl),
            ("auth.invite_ttl", self.auth.invite_ttl),
        ] {
            if ttl < MIN_TTL {
                problems.push(format!("{} must be at least 1m", key));
            } else if ttl > MAX_TTL {
                problems.push(format!("{} must be at most 365days", key));
            }
        }

        let cookie_ok = !self.auth.cookie_name.is_empty()
            && self
                .auth
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !cookie_ok {
            problems.push(format!("auth.cookie_name '{}' is not a valid cookie name", self.auth.cookie_name));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            problems.push(format!(
                "logging.level '{}' must be one of {}",
                self.logging.level,
                VALID_LOG_LEVELS.join(", ")
            ));
        }

        if self.storage.backend == BackendType::Postgres {
            if self.storage.postgres.connection_string.is_empty() {
                problems.push(
                    "storage.postgres.connection_string is required for the postgres backend"
                        .to_string(),
                );
            }
            if !self.storage.postgres.schema_is_valid() {
                problems.push(format!(
                    "storage.postgres.schema '{}' must be a lowercase identifier",
                    self.storage.postgres.schema
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(MarketError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                problems.join("; "),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.auth.cookie_name, "td_session");
        assert_eq!(config.auth.invite_ttl, Duration::from_secs(604_800));
        assert_eq!(config.storage.backend, BackendType::Memory);
    }

    #[test]
    fn test_from_toml_with_humantime() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            listen = "0.0.0.0:8080"
            public_url = "https://deck.example.com/"

            [auth]
            invite_ttl = "3d"
            session_ttl = "2h 30m"
            cookie_secure = true

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.base_url(), "https://deck.example.com");
        assert_eq!(config.auth.invite_ttl, Duration::from_secs(3 * 86_400));
        assert_eq!(config.auth.session_ttl, Duration::from_secs(9_000));
        assert!(config.auth.cookie_secure);
        assert_eq!(config.logging.format, LogFormat::Json);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nlisten = \"127.0.0.1:4000\"").unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:4000");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AppConfig::from_file(Path::new("/nonexistent/talentdeck.toml")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_NOT_FOUND);
    }

    #[test]
    fn test_file_parse_error_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[auth]\nsession_ttl = 12").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_PARSE_ERROR);
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_ttl_upper_bound() {
        let config = AppConfig::from_toml("[auth]\ninvite_ttl = \"300000years\"").unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_VALUE);
        assert!(err.to_string().contains("auth.invite_ttl must be at most 365days"));

        let config = AppConfig::from_toml("[auth]\nsession_ttl = \"30s\"").unwrap();
        assert!(config.validate().unwrap_err().to_string().contains("auth.session_ttl"));

        let config = AppConfig::from_toml("[auth]\nsession_ttl = \"365days\"").unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_error_code() {
        let err = AppConfig::from_toml("[auth]\ninvite_ttl = \"forever\"").unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_PARSE_ERROR);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.merge_env_from(lookup(&[
            ("TALENTDECK_LISTEN", "0.0.0.0:9000"),
            ("TALENTDECK_STORAGE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/td"),
            ("TALENTDECK_COOKIE_SECURE", "true"),
            ("TALENTDECK_LOG", "debug"),
        ]));
        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert_eq!(config.storage.backend, BackendType::Postgres);
        assert_eq!(config.storage.postgres.connection_string, "postgres://localhost/td");
        assert!(config.auth.cookie_secure);
        assert_eq!(config.logging.level, "debug");
        config.validate().unwrap();
    }

    #[test]
    fn test_specific_database_url_wins() {
        let mut config = AppConfig::default();
        config.merge_env_from(lookup(&[
            ("TALENTDECK_DATABASE_URL", "postgres://primary/td"),
            ("DATABASE_URL", "postgres://fallback/td"),
        ]));
        assert_eq!(config.storage.postgres.connection_string, "postgres://primary/td");
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let mut config = AppConfig::default();
        config.server.listen = "nope".to_string();
        config.server.public_url = "ftp://x".to_string();
        config.logging.level = "loud".to_string();
        config.storage.backend = BackendType::Postgres;

        let err = config.validate().unwrap_err();
        let message = err.to_string();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_VALUE);
        assert!(message.contains("server.listen"));
        assert!(message.contains("server.public_url"));
        assert!(message.contains("logging.level"));
        assert!(message.contains("connection_string"));
    }
}
