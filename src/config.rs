//! Configuration management for keepsake.
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). The resulting [`Config`] is built once in `main` and handed to
//! the pieces that need it; nothing reads the environment after startup.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub operations: OperationConfig,
    pub reconcile: ReconcileConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Grace period for in-flight work after a shutdown signal.
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobBackend {
    Filesystem,
    Memory,
}

impl std::str::FromStr for BlobBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "filesystem" | "fs" => Ok(Self::Filesystem),
            "memory" => Ok(Self::Memory),
            _ => Err(format!("Unknown blob backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: BlobBackend,
    pub uploads_path: String,
    pub limits: UploadLimits,
}

/// Limits applied to uploaded files before anything is written.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    /// Maximum size of a single file in bytes.
    pub max_file_size: usize,
    /// Maximum number of images attached to one memory.
    pub max_files_per_memory: usize,
}

impl UploadLimits {
    /// Largest request body the upload routes should accept.
    pub fn max_request_size(&self) -> usize {
        // Room for the form fields on top of the files themselves.
        self.max_file_size
            .saturating_mul(self.max_files_per_memory.max(1))
            .saturating_add(64 * 1024)
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            max_files_per_memory: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OperationConfig {
    /// Upper bound on a single coordinator operation.
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Interval between sweeps; `None` disables the periodic sweep.
    pub interval: Option<Duration>,
    /// Minimum age before an unreferenced blob may be deleted.
    pub orphan_grace: Duration,
    /// Delete orphans (true) or only report them (false).
    pub repair: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let reconcile_interval: u64 = parse_env("RECONCILE_INTERVAL_SECS", "3600")?;

        Ok(Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: parse_env("PORT", "5000")?,
                shutdown_timeout: Duration::from_secs(parse_env("SHUTDOWN_TIMEOUT_SECS", "10")?),
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/keepsake.db"),
            },
            storage: StorageConfig {
                backend: env_or("BLOB_BACKEND", "filesystem")
                    .parse()
                    .map_err(Error::Validation)?,
                uploads_path: env_or("UPLOADS_PATH", "./uploads"),
                limits: UploadLimits {
                    max_file_size: parse_env("MAX_UPLOAD_SIZE", "10485760")?,
                    max_files_per_memory: parse_env("MAX_FILES_PER_MEMORY", "20")?,
                },
            },
            operations: OperationConfig {
                timeout: Duration::from_secs(parse_env("OPERATION_TIMEOUT_SECS", "30")?),
            },
            reconcile: ReconcileConfig {
                interval: (reconcile_interval > 0).then(|| Duration::from_secs(reconcile_interval)),
                orphan_grace: Duration::from_secs(parse_env("ORPHAN_GRACE_SECS", "600")?),
                repair: env_or("RECONCILE_REPAIR", "true").to_lowercase() != "false",
            },
            logging: LoggingConfig {
                format: match env_or("LOG_FORMAT", "text").to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Text,
                },
            },
        })
    }
}

/// The configuration an empty environment produces.
impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 5000,
                shutdown_timeout: Duration::from_secs(10),
            },
            database: DatabaseConfig {
                path: "./data/keepsake.db".into(),
            },
            storage: StorageConfig {
                backend: BlobBackend::Filesystem,
                uploads_path: "./uploads".into(),
                limits: UploadLimits::default(),
            },
            operations: OperationConfig {
                timeout: Duration::from_secs(30),
            },
            reconcile: ReconcileConfig {
                interval: Some(Duration::from_secs(3600)),
                orphan_grace: Duration::from_secs(600),
                repair: true,
            },
            logging: LoggingConfig {
                format: LogFormat::Text,
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T> {
    let raw = env_or(key, default);
    raw.parse()
        .map_err(|_| Error::Validation(format!("Invalid {}: {}", key, raw)))
}
