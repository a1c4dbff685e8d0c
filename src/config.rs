//! Configuration module for depot.

use serde::Deserialize;
use std::path::Path;

use crate::{DepotError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string (e.g. `sqlite://data/depot.db`).
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection attempts made at startup before giving up.
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    /// Delay between connection attempts in seconds.
    #[serde(default = "default_connect_retry_secs")]
    pub connect_retry_secs: u64,
}

fn default_db_url() -> String {
    "sqlite://data/depot.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_connect_retry_secs() -> u64 {
    2
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
            connect_attempts: default_connect_attempts(),
            connect_retry_secs: default_connect_retry_secs(),
        }
    }
}

/// Physical storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory that every item path is relative to.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_root() -> String {
    "data/files".to_string()
}

fn default_max_upload_size() -> u64 {
    10
}

impl StorageConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_upload_size_mb: default_max_upload_size(),
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
    "logs/depot.log".to_string()
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
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Physical storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DepotError::Io)?;
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
        toml::from_str(s).map_err(|e| DepotError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DEPOT_DATABASE_URL`: database connection string
    /// - `DEPOT_STORAGE_ROOT`: base directory for stored items
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DEPOT_DATABASE_URL") {
            if !url.is_empty() {
                self.database.url = url;
            }
        }
        if let Ok(root) = std::env::var("DEPOT_STORAGE_ROOT") {
            if !root.is_empty() {
                self.storage.root = root;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(DepotError::Config("database.url must not be empty".to_string()));
        }
        if self.database.connect_attempts == 0 {
            return Err(DepotError::Config(
                "database.connect_attempts must be at least 1".to_string(),
            ));
        }
        if self.storage.root.trim().is_empty() {
            return Err(DepotError::Config("storage.root must not be empty".to_string()));
        }
        Ok(())
    }
}
