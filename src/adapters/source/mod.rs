//! Migration source adapters.

pub mod directory;
pub mod embedded;

pub use directory::DirectoryMigrationSource;
pub use embedded::EmbeddedMigrationSource;
