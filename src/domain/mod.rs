//! Domain layer for the migration runner
//!
//! Migration models, filename rules, errors and the source port.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{MigrationError, MigrationResult};
