//! s3wal Configuration
//!
//! TOML configuration for a log namespace and the object store backing it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::wal::RetryPolicy;

/// Main s3wal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3WalConfig {
    /// Log namespace configuration
    pub log: LogConfig,

    /// Object store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Append retry policy
    #[serde(default)]
    pub append: AppendConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log namespace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Key prefix shared by every record of this log
    pub prefix: String,
}

/// Which object store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files under a local directory
    Local,
    /// Process memory (lost on exit)
    Memory,
}

/// Object store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Root directory for the local backend
    #[serde(default = "default_storage_path")]
    pub path: Option<PathBuf>,
}

/// Append retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendConfig {
    /// Total attempts made by `append_with_retry` (1 = no retry)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff ceiling for the first retry in milliseconds
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Upper bound on any single backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_backend() -> StorageBackend {
    StorageBackend::Local
}

fn default_storage_path() -> Option<PathBuf> {
    Some(PathBuf::from("/var/lib/s3wal"))
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_backoff_ms() -> u64 {
    20
}

fn default_max_backoff_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
        }
    }
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl S3WalConfig {
    /// Configuration for an in-memory log, mostly useful in tests
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        Self {
            log: LogConfig {
                prefix: prefix.into(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                path: None,
            },
            append: AppendConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: S3WalConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        let prefix = &self.log.prefix;
        if prefix.is_empty() {
            return Err(crate::Error::Config("log.prefix cannot be empty".into()));
        }

        if prefix.starts_with('/') || prefix.ends_with('/') {
            return Err(crate::Error::Config(
                "log.prefix must not start or end with '/'".into(),
            ));
        }

        if self.storage.backend == StorageBackend::Local && self.storage.path.is_none() {
            return Err(crate::Error::Config(
                "storage.path is required for the local backend".into(),
            ));
        }

        if self.append.max_attempts == 0 {
            return Err(crate::Error::Config(
                "append.max_attempts must be at least 1".into(),
            ));
        }

        if self.append.base_backoff_ms > self.append.max_backoff_ms {
            return Err(crate::Error::Config(
                "append.base_backoff_ms cannot exceed append.max_backoff_ms".into(),
            ));
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(crate::Error::Config(format!(
                "logging.format must be 'pretty' or 'json', got {:?}",
                other
            ))),
        }
    }

    /// Get the namespace prefix
    pub fn prefix(&self) -> &str {
        &self.log.prefix
    }

    /// Build the append retry policy
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.append.max_attempts,
            base_backoff: Duration::from_millis(self.append.base_backoff_ms),
            max_backoff: Duration::from_millis(self.append.max_backoff_ms),
        }
    }
}
