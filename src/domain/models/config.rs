//! Configuration model, deserialized by the figment loader.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure for the migrator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Migration source and run configuration
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Connection URL (`sqlite:<path>`, `sqlite::memory:` or `postgres://...`)
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Force TLS on (`true`) or off (`false`) for PostgreSQL connections
    #[serde(default)]
    pub ssl: Option<bool>,

    /// When TLS is on, whether an unverifiable server certificate is rejected
    #[serde(default)]
    pub ssl_reject_unauthorized: Option<bool>,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_database_url() -> String {
    "sqlite:.schema-migrator/app.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_acquire_timeout_secs() -> u64 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            ssl: None,
            ssl_reject_unauthorized: None,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration pointing at the given URL with every other field defaulted.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Migration source and run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MigrationsConfig {
    /// Directory holding `<version>_<description>.sql` files
    #[serde(default = "default_migrations_directory")]
    pub directory: PathBuf,

    /// Hold a PostgreSQL advisory lock for the duration of a run
    #[serde(default = "default_true")]
    pub advisory_lock: bool,

    /// Seconds to wait for another run's advisory lock
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
}

fn default_migrations_directory() -> PathBuf {
    PathBuf::from("migrations")
}

const fn default_true() -> bool {
    true
}

const fn default_lock_timeout_secs() -> u64 {
    60
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            directory: default_migrations_directory(),
            advisory_lock: true,
            lock_timeout_secs: default_lock_timeout_secs(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Human-readable lines
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Directory for a daily-rolled JSON log file (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
