//! Migration domain models.
//!
//! A migration is a one-shot SQL script named `<version>_<description>.sql`.
//! Versions are compared numerically, so `9_x.sql` sorts before `10_y.sql`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{MigrationError, MigrationResult};

/// File extension every migration script must carry (case-sensitive).
pub const MIGRATION_EXTENSION: &str = ".sql";

/// Version and description parsed from a migration filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationName {
    /// Numeric version; leading zeros are insignificant.
    pub version: i64,
    /// Everything between the first `_` and the extension.
    pub description: String,
}

/// Parse `<digits>_<description>.sql`.
///
/// Returns `None` for anything else, including empty descriptions and
/// version numbers that do not fit in an `i64`.
pub fn parse_filename(name: &str) -> Option<MigrationName> {
    let stem = name.strip_suffix(MIGRATION_EXTENSION)?;
    let (digits, description) = stem.split_once('_')?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || description.is_empty() {
        return None;
    }

    let version = digits.parse::<i64>().ok()?;
    Some(MigrationName {
        version,
        description: description.to_string(),
    })
}

/// Whether a directory entry should be considered a migration candidate at all.
pub fn is_migration_candidate(name: &str) -> bool {
    name.ends_with(MIGRATION_EXTENSION)
}

/// One versioned script loaded from a migration source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Version parsed from the filename.
    pub version: i64,
    /// Description parsed from the filename.
    pub description: String,
    /// Filename as listed by the source.
    pub filename: String,
    /// Script executed verbatim.
    pub sql: String,
}

impl MigrationFile {
    /// Build a migration from its filename and contents, validating the name.
    pub fn from_parts(filename: impl Into<String>, sql: impl Into<String>) -> Option<Self> {
        let filename = filename.into();
        let MigrationName { version, description } = parse_filename(&filename)?;
        Some(Self {
            version,
            description,
            filename,
            sql: sql.into(),
        })
    }
}

/// Reject the whole set if any candidate name is invalid.
///
/// Names that are not `.sql` files are ignored. Every invalid name is
/// collected so the caller sees all of them at once.
pub fn validate_filenames<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> MigrationResult<Vec<(&'a str, MigrationName)>> {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for name in names.into_iter().filter(|n| is_migration_candidate(n)) {
        match parse_filename(name) {
            Some(parsed) => valid.push((name, parsed)),
            None => invalid.push(name.to_string()),
        }
    }

    if !invalid.is_empty() {
        invalid.sort();
        return Err(MigrationError::InvalidFilenames(invalid));
    }

    Ok(valid)
}

/// Order migrations by version and reject duplicate versions.
///
/// Every clashing version is collected before failing.
pub fn into_ordered_set(migrations: Vec<MigrationFile>) -> MigrationResult<Vec<MigrationFile>> {
    let mut by_version: BTreeMap<i64, Vec<MigrationFile>> = BTreeMap::new();
    for migration in migrations {
        by_version.entry(migration.version).or_default().push(migration);
    }

    let mut ordered = Vec::with_capacity(by_version.len());
    let mut duplicates = Vec::new();
    for (version, mut group) in by_version {
        if group.len() > 1 {
            let mut filenames: Vec<String> = group.into_iter().map(|m| m.filename).collect();
            filenames.sort();
            duplicates.push((version, filenames));
        } else {
            ordered.append(&mut group);
        }
    }

    if !duplicates.is_empty() {
        return Err(MigrationError::DuplicateVersions(duplicates));
    }

    Ok(ordered)
}

/// A row of the `schema_migrations` bookkeeping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigration {
    /// Version recorded as committed.
    pub version: i64,
    /// Filename at the time it was applied.
    pub filename: String,
    /// Commit time as recorded by the database.
    pub applied_at: DateTime<Utc>,
}

/// A migration committed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedVersion {
    /// Version that was committed.
    pub version: i64,
    /// File it came from.
    pub filename: String,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Migrations applied by this run, in application order.
    pub applied: Vec<AppliedVersion>,
    /// Migrations that were already recorded before the run started.
    pub skipped: usize,
    /// Wall time of the run, lock wait included.
    pub elapsed_ms: u128,
}

impl MigrationReport {
    /// Whether the run found nothing to apply.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }

    /// Versions applied by this run, in order.
    pub fn applied_versions(&self) -> Vec<i64> {
        self.applied.iter().map(|a| a.version).collect()
    }
}

/// Where a migration stands relative to the bookkeeping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    /// Present in the source and recorded.
    Applied,
    /// Present in the source, not recorded yet.
    Pending,
    /// Recorded in bookkeeping but no longer present in the source.
    Missing,
}

impl MigrationState {
    /// Lowercase label, as serialized.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Pending => "pending",
            Self::Missing => "missing",
        }
    }
}

/// One line of the status view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    /// Migration version.
    pub version: i64,
    /// Source filename, or the recorded one for missing migrations.
    pub filename: String,
    /// Applied, pending or missing.
    pub state: MigrationState,
    /// Set for applied and missing migrations.
    pub applied_at: Option<DateTime<Utc>>,
}

/// Merge source migrations with bookkeeping rows, ordered by version.
pub fn merge_status(source: &[MigrationFile], applied: &[AppliedMigration]) -> Vec<MigrationStatus> {
    let mut merged: BTreeMap<i64, MigrationStatus> = applied
        .iter()
        .map(|a| {
            (
                a.version,
                MigrationStatus {
                    version: a.version,
                    filename: a.filename.clone(),
                    state: MigrationState::Missing,
                    applied_at: Some(a.applied_at),
                },
            )
        })
        .collect();

    for migration in source {
        merged
            .entry(migration.version)
            .and_modify(|s| s.state = MigrationState::Applied)
            .or_insert_with(|| MigrationStatus {
                version: migration.version,
                filename: migration.filename.clone(),
                state: MigrationState::Pending,
                applied_at: None,
            });
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migration(name: &str) -> MigrationFile {
        MigrationFile::from_parts(name, "SELECT 1;").unwrap()
    }

    #[test]
    fn test_parse_valid_filename() {
        let parsed = parse_filename("001_create_organizations.sql").unwrap();
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.description, "create_organizations");
    }

    #[test]
    fn test_parse_keeps_separators_in_description() {
        let parsed = parse_filename("20_add_users.v2_backfill.sql").unwrap();
        assert_eq!(parsed.version, 20);
        assert_eq!(parsed.description, "add_users.v2_backfill");
    }

    #[test]
    fn test_parse_rejects_bad_names() {
        for name in [
            "create_users.sql",
            "_create_users.sql",
            "001_.sql",
            "001.sql",
            "001-create.sql",
            "-1_create.sql",
            "+1_create.sql",
            "001_create.SQL",
            "001_create.sql.bak",
            "99999999999999999999_too_big.sql",
            "",
        ] {
            assert!(parse_filename(name).is_none(), "{name} should be invalid");
        }
    }

    #[test]
    fn test_validate_ignores_non_sql_and_aggregates() {
        let names = ["001_ok.sql", "README.md", "bad.sql", "002-also-bad.sql", "notes.txt"];
        let err = validate_filenames(names).unwrap_err();
        match err {
            MigrationError::InvalidFilenames(bad) => {
                assert_eq!(bad, vec!["002-also-bad.sql".to_string(), "bad.sql".to_string()]);
            }
            other => panic!("expected InvalidFilenames, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_accepts_clean_set() {
        let valid = validate_filenames(["002_b.sql", ".keep", "001_a.sql"]).unwrap();
        assert_eq!(valid.len(), 2);
    }

    #[test]
    fn test_ordered_set_sorts_numerically() {
        let ordered =
            into_ordered_set(vec![migration("10_ten.sql"), migration("9_nine.sql"), migration("002_two.sql")]).unwrap();
        let versions: Vec<i64> = ordered.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![2, 9, 10]);
    }

    #[test]
    fn test_ordered_set_rejects_duplicates() {
        let err = into_ordered_set(vec![migration("3_a.sql"), migration("003_b.sql")]).unwrap_err();
        match err {
            MigrationError::DuplicateVersions(dups) => {
                assert_eq!(dups, vec![(3, vec!["003_b.sql".to_string(), "3_a.sql".to_string()])]);
            }
            other => panic!("expected DuplicateVersions, got {other:?}"),
        }
    }

    #[test]
    fn test_ordered_set_reports_every_duplicate_version() {
        let err = into_ordered_set(vec![
            migration("1_a.sql"),
            migration("001_b.sql"),
            migration("2_c.sql"),
            migration("02_d.sql"),
            migration("3_e.sql"),
        ])
        .unwrap_err();

        match err {
            MigrationError::DuplicateVersions(dups) => {
                let versions: Vec<i64> = dups.iter().map(|(v, _)| *v).collect();
                assert_eq!(versions, vec![1, 2]);
                assert!(dups[1].1.contains(&"02_d.sql".to_string()));
            }
            other => panic!("expected DuplicateVersions, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_status_marks_each_state() {
        let source = vec![migration("001_a.sql"), migration("002_b.sql")];
        let applied = vec![
            AppliedMigration {
                version: 1,
                filename: "001_a.sql".to_string(),
                applied_at: Utc::now(),
            },
            AppliedMigration {
                version: 7,
                filename: "007_gone.sql".to_string(),
                applied_at: Utc::now(),
            },
        ];

        let status = merge_status(&source, &applied);
        let states: Vec<(i64, MigrationState)> = status.iter().map(|s| (s.version, s.state)).collect();
        assert_eq!(
            states,
            vec![
                (1, MigrationState::Applied),
                (2, MigrationState::Pending),
                (7, MigrationState::Missing),
            ]
        );
        assert!(status[1].applied_at.is_none());
    }
}
