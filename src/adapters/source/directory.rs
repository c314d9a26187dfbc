//! Filesystem migration source.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::domain::errors::{MigrationError, MigrationResult};
use crate::domain::models::migration::{into_ordered_set, validate_filenames};
use crate::domain::models::MigrationFile;
use crate::domain::ports::MigrationSource;

/// Reads `<version>_<description>.sql` files from a single directory.
///
/// Subdirectories and files without the `.sql` extension are ignored.
#[derive(Debug, Clone)]
pub struct DirectoryMigrationSource {
    path: PathBuf,
}

impl DirectoryMigrationSource {
    /// Source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Directory this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn source_error(&self, source: std::io::Error) -> MigrationError {
        MigrationError::Source {
            path: self.path.clone(),
            source,
        }
    }

    /// Names of the regular files in the directory, in listing order.
    async fn file_names(&self) -> MigrationResult<Vec<String>> {
        let mut entries = fs::read_dir(&self.path).await.map_err(|e| self.source_error(e))?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(|e| self.source_error(e))? {
            let file_type = entry.file_type().await.map_err(|e| self.source_error(e))?;
            if file_type.is_dir() {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        Ok(names)
    }
}

#[async_trait]
impl MigrationSource for DirectoryMigrationSource {
    async fn list(&self) -> MigrationResult<Vec<MigrationFile>> {
        let names = self.file_names().await?;

        // Every name is validated before any file is read.
        let valid = validate_filenames(names.iter().map(String::as_str))?;

        let mut migrations = Vec::with_capacity(valid.len());
        for (filename, parsed) in valid {
            let sql = fs::read_to_string(self.path.join(filename))
                .await
                .map_err(|e| self.source_error(e))?;
            migrations.push(MigrationFile {
                version: parsed.version,
                description: parsed.description,
                filename: filename.to_string(),
                sql,
            });
        }

        into_ordered_set(migrations)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.path.display())
    }
}
