//! Schema Migrator - versioned SQL migrations for relational databases
//!
//! Migrations are plain `.sql` files named `<version>_<description>.sql`.
//! Each pending file runs in its own transaction, in ascending numeric
//! version order, and is recorded in a `schema_migrations` table so later
//! runs skip it.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Migration models, errors and the source port
//! - **Adapters** (`adapters`): Migration sources and the SQL migrator
//! - **Service Layer** (`services`): Config-driven run, status and scaffolding
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use schema_migrator::{DirectoryMigrationSource, Migrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = schema_migrator::create_pool(&Default::default()).await?;
//!     let report = Migrator::new(pool).run(&DirectoryMigrationSource::new("migrations")).await?;
//!     println!("applied {:?}", report.applied_versions());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::source::{DirectoryMigrationSource, EmbeddedMigrationSource};
pub use adapters::sql::{create_pool, ConnectionError, DatabaseError, Migrator, MigratorOptions};
pub use domain::errors::{MigrationError, MigrationResult};
pub use domain::models::{
    parse_filename, AppliedMigration, Config, DatabaseConfig, LoggingConfig, MigrationFile, MigrationReport,
    MigrationState, MigrationStatus, MigrationsConfig,
};
pub use domain::ports::MigrationSource;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{create_migration, migration_status, run_migrations};
