//! In-memory migration source, for scripts compiled into a binary with
//! `include_str!` and for test fixtures.

use async_trait::async_trait;

use crate::domain::errors::MigrationResult;
use crate::domain::models::migration::{into_ordered_set, validate_filenames};
use crate::domain::models::MigrationFile;
use crate::domain::ports::MigrationSource;

/// Migration scripts held in memory as `(filename, sql)` pairs.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedMigrationSource {
    scripts: Vec<(String, String)>,
}

impl EmbeddedMigrationSource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a script under the filename it would have on disk.
    #[must_use]
    pub fn with(mut self, filename: impl Into<String>, sql: impl Into<String>) -> Self {
        self.scripts.push((filename.into(), sql.into()));
        self
    }

    /// Number of scripts, valid or not.
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Whether no scripts were added.
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for EmbeddedMigrationSource {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        Self {
            scripts: iter.into_iter().map(|(n, s)| (n.into(), s.into())).collect(),
        }
    }
}

#[async_trait]
impl MigrationSource for EmbeddedMigrationSource {
    async fn list(&self) -> MigrationResult<Vec<MigrationFile>> {
        let valid = validate_filenames(self.scripts.iter().map(|(name, _)| name.as_str()))?;

        let migrations = valid
            .into_iter()
            .filter_map(|(filename, parsed)| {
                let (_, sql) = self.scripts.iter().find(|(name, _)| name == filename)?;
                Some(MigrationFile {
                    version: parsed.version,
                    description: parsed.description,
                    filename: filename.to_string(),
                    sql: sql.clone(),
                })
            })
            .collect();

        into_ordered_set(migrations)
    }

    fn describe(&self) -> String {
        format!("{} embedded script(s)", self.scripts.len())
    }
}
