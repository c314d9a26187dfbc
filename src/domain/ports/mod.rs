//! Port trait definitions (Hexagonal Architecture)
//!
//! - MigrationSource: where migration scripts come from (directory, embedded)

pub mod migration_source;

pub use migration_source::MigrationSource;
