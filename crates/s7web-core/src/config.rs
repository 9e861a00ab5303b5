//! Configuration module for s7web.
//!
//! Typed configuration structs mapping to the YAML configuration file, with
//! loading, validation and defaults. Behavior toggles (completion checks,
//! retry bounds) live here and are passed into the engines at construction;
//! nothing is flipped mid-flight.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::ports::local_source::IgnoreConfig;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for s7web.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub transfer: TransferConfig,
    pub deploy: DeployConfig,
    pub logging: LoggingConfig,
}

/// Device connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the device webserver (e.g. `https://192.168.0.1`).
    pub base_url: String,
    /// Whether to verify the device's TLS certificate.
    pub verify_tls: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Ticket transfer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Verify the ticket reached `Completed` after a download.
    ///
    /// Some firmwares complete download tickets asynchronously; disabling
    /// the check accepts the payload without the state assertion.
    pub check_after_download: bool,
    /// Verify the ticket reached `Completed` after an upload.
    pub check_after_upload: bool,
    /// Overwrite existing local files on download instead of picking a
    /// non-colliding `name(0).ext` style name.
    pub overwrite_downloads: bool,
}

/// Deployment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Maximum number of apply/verify rounds per deployment (minimum 1).
    pub retries: u32,
    /// Names and extensions skipped when scanning the local tree.
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Optional log file; stderr when unset.
    pub file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/s7web/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("s7web")
            .join("config.yaml")
    }

    /// Fail fast on configuration values the engines would reject later.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.deploy.retries < 1 {
            return Err(DomainError::InvalidRetryCount(self.deploy.retries));
        }
        if self.connection.base_url.is_empty() {
            return Err(DomainError::ValidationFailed(
                "connection.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://192.168.0.1".to_string(),
            verify_tls: true,
            timeout_secs: 60,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            check_after_download: true,
            check_after_upload: true,
            overwrite_downloads: false,
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
