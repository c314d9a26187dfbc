//! Domain errors for the migration runner.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, validating or applying migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// One or more `.sql` files do not match `<digits>_<description>.sql`.
    /// Every offending name is listed; nothing is applied.
    #[error("Invalid migration filename(s), expected <version>_<description>.sql: {}", .0.join(", "))]
    InvalidFilenames(Vec<String>),

    /// Two or more files share a version. Every clashing version is listed
    /// with its files; nothing is applied.
    #[error("Duplicate migration version(s): {}", describe_duplicates(.0))]
    DuplicateVersions(Vec<(i64, Vec<String>)>),

    /// The source could not be listed or a script could not be read.
    #[error("Failed to read migrations from {}: {source}", path.display())]
    Source {
        /// Directory or file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The migration's transaction was rolled back; neither its schema change
    /// nor its bookkeeping row persisted.
    #[error("Migration {filename} (version {version}) failed: {source}")]
    Execution {
        /// Version of the failing migration.
        version: i64,
        /// File of the failing migration.
        filename: String,
        /// Driver error raised by the script or the bookkeeping insert.
        #[source]
        source: sqlx::Error,
    },

    /// Creating or reading `schema_migrations` failed.
    #[error("Bookkeeping query failed: {0}")]
    Bookkeeping(#[source] sqlx::Error),

    /// The advisory lock query failed.
    #[error("Failed to acquire migration lock: {0}")]
    Lock(#[source] sqlx::Error),

    /// Another run held the advisory lock past the timeout.
    #[error("Timed out after {waited_secs}s waiting for another migration run to finish")]
    LockTimeout {
        /// Configured timeout.
        waited_secs: u64,
    },
}

impl MigrationError {
    /// Filename of the migration that failed to apply, if this is an execution failure.
    pub fn failed_filename(&self) -> Option<&str> {
        match self {
            Self::Execution { filename, .. } => Some(filename),
            _ => None,
        }
    }
}

/// Result alias for migration operations.
pub type MigrationResult<T> = Result<T, MigrationError>;

fn describe_duplicates(duplicates: &[(i64, Vec<String>)]) -> String {
    duplicates
        .iter()
        .map(|(version, filenames)| format!("{version} ({})", filenames.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}
