//! Migration source port.

use async_trait::async_trait;

use crate::domain::errors::MigrationResult;
use crate::domain::models::MigrationFile;

/// Anything that can produce the full, validated set of migrations.
#[async_trait]
pub trait MigrationSource: Send + Sync {
    /// All migrations, sorted by ascending version.
    ///
    /// Fails closed: a single invalid filename or duplicate version rejects
    /// the whole set.
    async fn list(&self) -> MigrationResult<Vec<MigrationFile>>;

    /// Human-readable origin used in logs.
    fn describe(&self) -> String;
}
