//! Database connection pool management.
//!
//! Pools are `sqlx::AnyPool`s so the same runner drives SQLite and PostgreSQL;
//! the backend is picked from the URL scheme.

use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::domain::models::DatabaseConfig;

/// Errors raised while opening or checking a database connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The driver could not open the pool.
    #[error("Failed to create pool: {0}")]
    PoolCreationFailed(#[source] sqlx::Error),
    /// Empty URL or unsupported scheme.
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),
    /// The SQLite database directory could not be created.
    #[error("Failed to create directory: {0}")]
    DirectoryCreationFailed(#[source] std::io::Error),
    /// A connectivity check query failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),
}

/// Database family behind a connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `sqlite:` URLs
    Sqlite,
    /// `postgres://` and `postgresql://` URLs
    Postgres,
}

impl Backend {
    /// Detect the backend from the URL scheme.
    pub fn from_url(url: &str) -> Result<Self, ConnectionError> {
        if url.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else {
            Err(ConnectionError::InvalidDatabaseUrl(url.to_string()))
        }
    }
}

/// Resolve the URL actually handed to the driver.
///
/// PostgreSQL URLs without an explicit `sslmode` get one derived from the
/// `ssl` / `ssl_reject_unauthorized` settings. SQLite file URLs are opened
/// read-write-create.
pub fn connection_url(config: &DatabaseConfig) -> Result<String, ConnectionError> {
    let url = config.url.trim();
    if url.is_empty() {
        return Err(ConnectionError::InvalidDatabaseUrl(String::new()));
    }

    match Backend::from_url(url)? {
        Backend::Postgres => {
            if url.contains("sslmode=") {
                return Ok(url.to_string());
            }
            let mode = match (config.ssl, config.ssl_reject_unauthorized) {
                (None, _) => return Ok(url.to_string()),
                (Some(false), _) => "disable",
                (Some(true), Some(false)) => "require",
                (Some(true), _) => "verify-full",
            };
            Ok(append_query(url, "sslmode", mode))
        }
        Backend::Sqlite => {
            if is_memory_url(url) || url.contains("mode=") {
                Ok(url.to_string())
            } else {
                Ok(append_query(url, "mode", "rwc"))
            }
        }
    }
}

fn append_query(url: &str, key: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{key}={value}")
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Open a pool for `config`, creating the SQLite database directory when needed.
pub async fn create_pool(config: &DatabaseConfig) -> Result<AnyPool, ConnectionError> {
    install_default_drivers();

    let url = connection_url(config)?;
    if Backend::from_url(&url)? == Backend::Sqlite {
        ensure_database_directory(&url)?;
    }

    let pool = AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&url)
        .await
        .map_err(ConnectionError::PoolCreationFailed)?;

    tracing::debug!(
        backend = ?Backend::from_url(&url)?,
        max_connections = config.max_connections,
        "database pool created"
    );

    Ok(pool)
}

/// Single-connection in-memory SQLite pool.
///
/// The connection is never recycled, so the database lives as long as the pool.
pub async fn create_test_pool() -> Result<AnyPool, ConnectionError> {
    install_default_drivers();

    AnyPoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .map_err(ConnectionError::PoolCreationFailed)
}

fn ensure_database_directory(database_url: &str) -> Result<(), ConnectionError> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = path.split('?').next().unwrap_or(path);

    if path.is_empty() || is_memory_url(database_url) {
        return Ok(());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(ConnectionError::DirectoryCreationFailed)?;
        }
    }
    Ok(())
}

/// Run a trivial query to prove the pool can reach the database.
pub async fn verify_connection(pool: &AnyPool) -> Result<(), ConnectionError> {
    sqlx::query("SELECT 1").execute(pool).await.map_err(ConnectionError::ConnectionFailed)?;
    Ok(())
}
