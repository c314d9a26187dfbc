//! Service layer: configuration-driven entry points over the migrator.

pub mod migration_service;

pub use migration_service::{create_migration, migration_status, run_migrations, ScaffoldError};
