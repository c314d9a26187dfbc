//! Top-level migration entry points.
//!
//! These connect with a [`Config`], drive the [`Migrator`] against the
//! configured directory and close the pool again. Callers that own a pool
//! use [`Migrator`] directly.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

use crate::adapters::source::DirectoryMigrationSource;
use crate::adapters::sql::{create_pool, DatabaseError, Migrator, MigratorOptions};
use crate::domain::errors::MigrationError;
use crate::domain::models::{Config, MigrationReport, MigrationStatus};
use crate::domain::ports::MigrationSource;

/// Connect, apply every pending migration from `config.migrations.directory`
/// and disconnect.
pub async fn run_migrations(config: &Config) -> Result<MigrationReport, DatabaseError> {
    let pool = create_pool(&config.database).await?;
    let migrator = Migrator::with_options(pool.clone(), MigratorOptions::from(&config.migrations));
    let source = DirectoryMigrationSource::new(&config.migrations.directory);

    let result = migrator.run(&source).await;
    pool.close().await;
    Ok(result?)
}

/// Connect, report applied, pending and missing migrations, and disconnect.
pub async fn migration_status(config: &Config) -> Result<Vec<MigrationStatus>, DatabaseError> {
    let pool = create_pool(&config.database).await?;
    let migrator = Migrator::with_options(pool.clone(), MigratorOptions::from(&config.migrations));
    let source = DirectoryMigrationSource::new(&config.migrations.directory);

    let result = migrator.status(&source).await;
    pool.close().await;
    Ok(result?)
}

/// Errors raised by [`create_migration`].
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// The description slugifies to nothing.
    #[error("Migration description must contain at least one letter or digit")]
    EmptyDescription,
    /// The existing directory failed validation.
    #[error(transparent)]
    Migration(#[from] MigrationError),
    /// Creating the directory or the file failed.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Lowercase `description`, collapsing runs of anything but ASCII letters and
/// digits into a single `_`.
pub fn slugify(description: &str) -> String {
    let mut slug = String::with_capacity(description.len());
    for c in description.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// Filename for the migration following `latest`, zero-padded to three digits.
pub fn next_filename(latest: Option<i64>, slug: &str) -> String {
    let version = latest.map_or(1, |v| v + 1);
    format!("{version:03}_{slug}.sql")
}

/// Create the next `<version>_<slug>.sql` file in `directory`.
///
/// Existing files are validated first; an invalid name anywhere refuses the
/// scaffold with the same aggregated error a run would report.
pub async fn create_migration(directory: &Path, description: &str) -> Result<PathBuf, ScaffoldError> {
    let slug = slugify(description);
    if slug.is_empty() {
        return Err(ScaffoldError::EmptyDescription);
    }

    fs::create_dir_all(directory).await.map_err(|source| ScaffoldError::Write {
        path: directory.to_path_buf(),
        source,
    })?;

    let existing = DirectoryMigrationSource::new(directory).list().await?;
    let latest = existing.last().map(|m| m.version);

    let path = directory.join(next_filename(latest, &slug));
    let contents = format!("-- {}\n", description.trim());
    fs::write(&path, contents).await.map_err(|source| ScaffoldError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!(path = %path.display(), "migration created");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Add users table"), "add_users_table");
        assert_eq!(slugify("  create: org--domains!! "), "create_org_domains");
        assert_eq!(slugify("v2 Backfill"), "v2_backfill");
        assert_eq!(slugify("--- !!"), "");
    }

    #[test]
    fn test_next_filename() {
        assert_eq!(next_filename(None, "init"), "001_init.sql");
        assert_eq!(next_filename(Some(9), "next"), "010_next.sql");
        assert_eq!(next_filename(Some(1233), "big"), "1234_big.sql");
    }

    #[tokio::test]
    async fn test_create_migration_numbers_after_latest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("001_init.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("9_later.sql"), "SELECT 9;").unwrap();

        let path = create_migration(dir.path(), "Add edit bans").await.unwrap();

        assert_eq!(path.file_name().unwrap(), "010_add_edit_bans.sql");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "-- Add edit bans\n");
    }

    #[tokio::test]
    async fn test_create_migration_makes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("db").join("migrations");

        let path = create_migration(&target, "init").await.unwrap();
        assert_eq!(path, target.join("001_init.sql"));
    }

    #[tokio::test]
    async fn test_create_migration_refuses_invalid_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("oops.sql"), "SELECT 1;").unwrap();

        let err = create_migration(dir.path(), "next").await.unwrap_err();
        assert!(matches!(err, ScaffoldError::Migration(MigrationError::InvalidFilenames(_))));
    }

    #[tokio::test]
    async fn test_create_migration_rejects_empty_description() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_migration(dir.path(), " ?! ").await.unwrap_err();
        assert!(matches!(err, ScaffoldError::EmptyDescription));
    }
}
