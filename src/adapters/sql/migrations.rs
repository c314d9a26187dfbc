//! Database migration management.
//!
//! Applies pending migrations from a [`MigrationSource`] in ascending version
//! order. Each migration's SQL and its `schema_migrations` row commit in one
//! transaction, so the bookkeeping table is always an exact record of the
//! scripts that took effect.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use sqlx::{Any, AnyPool, Transaction};

use super::lock::MigrationLock;
use super::parse_datetime;
use crate::domain::errors::{MigrationError, MigrationResult};
use crate::domain::models::migration::merge_status;
use crate::domain::models::{
    AppliedMigration, AppliedVersion, MigrationFile, MigrationReport, MigrationStatus, MigrationsConfig,
};
use crate::domain::ports::MigrationSource;

const CREATE_MIGRATIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version BIGINT PRIMARY KEY,
    filename TEXT NOT NULL,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const RECORD_MIGRATION: &str = "INSERT INTO schema_migrations (version, filename) VALUES ($1, $2)";

/// Knobs for a [`Migrator`] run.
#[derive(Debug, Clone)]
pub struct MigratorOptions {
    /// Serialize concurrent runs with an advisory lock (PostgreSQL only).
    pub advisory_lock: bool,
    /// How long to wait for a concurrent run to release the lock.
    pub lock_timeout: Duration,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self::from(&MigrationsConfig::default())
    }
}

impl From<&MigrationsConfig> for MigratorOptions {
    fn from(config: &MigrationsConfig) -> Self {
        Self {
            advisory_lock: config.advisory_lock,
            lock_timeout: Duration::from_secs(config.lock_timeout_secs),
        }
    }
}

/// Applies migrations through an injected pool.
pub struct Migrator {
    pool: AnyPool,
    options: MigratorOptions,
}

impl Migrator {
    /// Migrator with default options: advisory lock on, 60s timeout.
    pub fn new(pool: AnyPool) -> Self {
        Self::with_options(pool, MigratorOptions::default())
    }

    /// Migrator with explicit options.
    pub fn with_options(pool: AnyPool, options: MigratorOptions) -> Self {
        Self { pool, options }
    }

    /// The pool migrations run against.
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Apply every pending migration from `source`.
    ///
    /// Stops at the first failure. Migrations committed earlier in the same
    /// run stay committed; re-running resumes at the first pending version.
    pub async fn run<S>(&self, source: &S) -> MigrationResult<MigrationReport>
    where
        S: MigrationSource + ?Sized,
    {
        let started = Instant::now();

        let lock = if self.options.advisory_lock {
            MigrationLock::acquire(&self.pool, self.options.lock_timeout).await?
        } else {
            MigrationLock::none()
        };

        let result = self.run_pending(source, started).await;
        lock.release().await;
        result
    }

    async fn run_pending<S>(&self, source: &S, started: Instant) -> MigrationResult<MigrationReport>
    where
        S: MigrationSource + ?Sized,
    {
        self.ensure_migrations_table().await?;

        let migrations = source.list().await?;
        let applied = self.applied_versions().await?;

        let pending: Vec<&MigrationFile> = migrations
            .iter()
            .filter(|m| !applied.contains(&m.version))
            .collect();
        let skipped = migrations.len() - pending.len();

        tracing::debug!(
            source = %source.describe(),
            total = migrations.len(),
            applied = applied.len(),
            pending = pending.len(),
            "migrations loaded"
        );

        let known: BTreeSet<i64> = migrations.iter().map(|m| m.version).collect();
        for version in applied.difference(&known) {
            tracing::warn!(version, "applied migration is missing from the source");
        }

        if pending.is_empty() {
            return Ok(MigrationReport {
                applied: Vec::new(),
                skipped,
                elapsed_ms: started.elapsed().as_millis(),
            });
        }

        let mut applied_now = Vec::with_capacity(pending.len());
        for migration in pending {
            if let Err(e) = self.apply_migration(migration).await {
                tracing::error!(
                    version = migration.version,
                    filename = %migration.filename,
                    error = %e,
                    "migration failed, run aborted"
                );
                return Err(e);
            }
            applied_now.push(AppliedVersion {
                version: migration.version,
                filename: migration.filename.clone(),
            });
        }

        let report = MigrationReport {
            applied: applied_now,
            skipped,
            elapsed_ms: started.elapsed().as_millis(),
        };
        tracing::info!(
            applied = report.applied.len(),
            skipped = report.skipped,
            elapsed_ms = report.elapsed_ms as u64,
            "migrations complete"
        );
        Ok(report)
    }

    /// Create the bookkeeping table if it does not exist yet.
    pub async fn ensure_migrations_table(&self) -> MigrationResult<()> {
        sqlx::query(CREATE_MIGRATIONS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(MigrationError::Bookkeeping)?;
        Ok(())
    }

    /// Versions recorded in `schema_migrations`.
    pub async fn applied_versions(&self) -> MigrationResult<BTreeSet<i64>> {
        let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_migrations ORDER BY version")
            .fetch_all(&self.pool)
            .await
            .map_err(MigrationError::Bookkeeping)?;
        Ok(versions.into_iter().collect())
    }

    /// Full bookkeeping rows, ordered by version.
    pub async fn applied_migrations(&self) -> MigrationResult<Vec<AppliedMigration>> {
        let rows: Vec<(i64, String, String)> = sqlx::query_as(
            "SELECT version, filename, CAST(applied_at AS TEXT) FROM schema_migrations ORDER BY version",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(MigrationError::Bookkeeping)?;

        rows.into_iter()
            .map(|(version, filename, applied_at)| {
                let applied_at = parse_datetime(&applied_at)
                    .map_err(|e| MigrationError::Bookkeeping(sqlx::Error::Decode(Box::new(e))))?;
                Ok(AppliedMigration {
                    version,
                    filename,
                    applied_at,
                })
            })
            .collect()
    }

    /// Run one migration and record it, atomically.
    ///
    /// On failure the transaction is rolled back and the error names the file.
    pub async fn apply_migration(&self, migration: &MigrationFile) -> MigrationResult<()> {
        let execution_error = |source| MigrationError::Execution {
            version: migration.version,
            filename: migration.filename.clone(),
            source,
        };

        let mut tx = self.pool.begin().await.map_err(execution_error)?;

        if let Err(e) = Self::execute_and_record(&mut tx, migration).await {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, filename = %migration.filename, "rollback failed");
            }
            return Err(execution_error(e));
        }

        tx.commit().await.map_err(execution_error)?;

        tracing::info!(
            version = migration.version,
            filename = %migration.filename,
            "migration applied"
        );
        Ok(())
    }

    async fn execute_and_record(
        tx: &mut Transaction<'static, Any>,
        migration: &MigrationFile,
    ) -> Result<(), sqlx::Error> {
        if !migration.sql.trim().is_empty() {
            sqlx::raw_sql(&migration.sql).execute(&mut **tx).await?;
        }

        sqlx::query(RECORD_MIGRATION)
            .bind(migration.version)
            .bind(&migration.filename)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Applied, pending and missing migrations, ordered by version.
    pub async fn status<S>(&self, source: &S) -> MigrationResult<Vec<MigrationStatus>>
    where
        S: MigrationSource + ?Sized,
    {
        self.ensure_migrations_table().await?;
        let migrations = source.list().await?;
        let applied = self.applied_migrations().await?;
        Ok(merge_status(&migrations, &applied))
    }
}
