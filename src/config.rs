//! Configuration module for assetvault.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, VaultError};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/assetvault.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Upload and asset storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    /// Root directory holding every published asset.
    #[serde(default = "default_upload_root")]
    pub root: String,
    /// URL prefix under which published assets are served.
    #[serde(default = "default_public_url_prefix")]
    pub public_url_prefix: String,
    /// Maximum size of a single chunk in megabytes.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size_mb: u64,
    /// Maximum number of chunks in one upload session.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: u32,
    /// Maximum number of suffixed names tried on a filename collision.
    #[serde(default = "default_max_name_probes")]
    pub max_name_probes: u32,
}

fn default_upload_root() -> String {
    "data/uploads".to_string()
}

fn default_public_url_prefix() -> String {
    "/uploads/".to_string()
}

fn default_max_chunk_size() -> u64 {
    8
}

fn default_max_chunks() -> u32 {
    10_000
}

fn default_max_name_probes() -> u32 {
    1000
}

impl UploadsConfig {
    /// Maximum chunk size in bytes.
    pub fn max_chunk_bytes(&self) -> usize {
        (self.max_chunk_size_mb * 1024 * 1024) as usize
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            root: default_upload_root(),
            public_url_prefix: default_public_url_prefix(),
            max_chunk_size_mb: default_max_chunk_size(),
            max_chunks: default_max_chunks(),
            max_name_probes: default_max_name_probes(),
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
    "logs/assetvault.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web admin configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the admin API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Secret used to verify session tokens issued by the admin panel.
    #[serde(default)]
    pub jwt_secret: String,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            jwt_secret: String::new(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload configuration.
    #[serde(default)]
    pub uploads: UploadsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web configuration.
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(VaultError::Io)?;
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
        toml::from_str(s).map_err(|e| VaultError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `ASSETVAULT_JWT_SECRET`: Override the session token secret
    /// - `ASSETVAULT_UPLOAD_ROOT`: Override the upload root directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("ASSETVAULT_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.web.jwt_secret = jwt_secret;
            }
        }

        if let Ok(root) = std::env::var("ASSETVAULT_UPLOAD_ROOT") {
            if !root.is_empty() {
                self.uploads.root = root;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(VaultError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via ASSETVAULT_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.uploads.max_chunk_size_mb == 0 {
            return Err(VaultError::Config(
                "uploads.max_chunk_size_mb must be greater than zero".to_string(),
            ));
        }
        if self.uploads.max_chunks == 0 {
            return Err(VaultError::Config(
                "uploads.max_chunks must be greater than zero".to_string(),
            ));
        }
        if self.uploads.max_name_probes == 0 {
            return Err(VaultError::Config(
                "uploads.max_name_probes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
