//! SQL database adapters: connection pools, the run lock and the migrator.

pub mod connection;
pub mod lock;
pub mod migrations;

pub use connection::{connection_url, create_pool, create_test_pool, verify_connection, Backend, ConnectionError};
pub use lock::{MigrationLock, MIGRATION_LOCK_KEY};
pub use migrations::{Migrator, MigratorOptions};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::domain::errors::MigrationError;

/// Parse a timestamp read back as text.
///
/// Supports:
/// - RFC3339: "2026-10-18T17:28:13Z", "2026-10-18T17:28:13+00:00"
/// - SQLite `CURRENT_TIMESTAMP`: "2026-10-18 17:28:13"
/// - PostgreSQL `timestamp::text`: "2026-10-18 17:28:13.123456"
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive_dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive_dt, Utc));
    }

    // PostgreSQL `timestamptz::text` carries a short offset such as "+00".
    DateTime::parse_from_str(&format!("{s}00"), "%Y-%m-%d %H:%M:%S%.f%z").map(|dt| dt.with_timezone(&Utc))
}

/// Failure of a config-driven run: connecting or migrating.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Could not connect.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    /// Connected, but loading or applying migrations failed.
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}
