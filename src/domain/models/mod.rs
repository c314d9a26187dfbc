//! Domain models.

pub mod config;
pub mod migration;

pub use config::{Config, DatabaseConfig, LogFormat, LoggingConfig, MigrationsConfig};
pub use migration::{
    merge_status, parse_filename, AppliedMigration, AppliedVersion, MigrationFile, MigrationName,
    MigrationReport, MigrationState, MigrationStatus,
};
