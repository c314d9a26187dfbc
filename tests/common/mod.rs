//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use schema_migrator::{Config, DatabaseConfig, MigrationsConfig};
use tempfile::TempDir;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Migrations shipped with the repository.
pub fn repo_migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

/// Config pointing at a SQLite file inside `dir` and at `migrations`.
pub fn sqlite_config(dir: &Path, migrations: &Path) -> Config {
    Config {
        database: DatabaseConfig::with_url(format!("sqlite:{}", dir.join("db").join("test.db").display())),
        migrations: MigrationsConfig {
            directory: migrations.to_path_buf(),
            ..MigrationsConfig::default()
        },
        ..Config::default()
    }
}

/// Write a migration script into `dir`.
pub fn write_migration(dir: &Path, filename: &str, sql: &str) {
    std::fs::create_dir_all(dir).expect("Failed to create migrations dir");
    std::fs::write(dir.join(filename), sql).expect("Failed to write migration");
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
