//! Implementation of the `schema-migrator status` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::display::{colorize_state, list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, MigrationState, MigrationStatus};
use crate::services::migration_status;

/// Arguments of `status`.
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Only list migrations that have not been applied yet
    #[arg(long)]
    pub pending: bool,
}

/// Output of `status`.
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    /// Listed migrations, ordered by version.
    pub migrations: Vec<MigrationStatus>,
    /// Applied count over the whole set.
    pub applied: usize,
    /// Pending count over the whole set.
    pub pending: usize,
}

impl StatusOutput {
    /// Count states, then keep only pending rows when `pending_only`.
    pub fn new(migrations: Vec<MigrationStatus>, pending_only: bool) -> Self {
        let count = |state| migrations.iter().filter(|m| m.state == state).count();
        let applied = count(MigrationState::Applied);
        let pending = count(MigrationState::Pending);

        let migrations = if pending_only {
            migrations
                .into_iter()
                .filter(|m| m.state == MigrationState::Pending)
                .collect()
        } else {
            migrations
        };

        Self {
            migrations,
            applied,
            pending,
        }
    }
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["version", "filename", "state", "applied at"]);
        for m in &self.migrations {
            table.add_row(vec![
                m.version.to_string(),
                m.filename.clone(),
                colorize_state(m.state).to_string(),
                m.applied_at
                    .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            ]);
        }

        format!(
            "{}\n\n{} applied, {} pending",
            render_list("migration", &table, self.migrations.len()),
            self.applied,
            self.pending
        )
    }
}

/// Print the status of every migration.
pub async fn execute(args: StatusArgs, config: Config, json_mode: bool) -> Result<()> {
    let migrations = migration_status(&config).await?;
    output(&StatusOutput::new(migrations, args.pending), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> Vec<MigrationStatus> {
        vec![
            MigrationStatus {
                version: 1,
                filename: "001_init.sql".to_string(),
                state: MigrationState::Applied,
                applied_at: Some(Utc::now()),
            },
            MigrationStatus {
                version: 2,
                filename: "002_users.sql".to_string(),
                state: MigrationState::Pending,
                applied_at: None,
            },
        ]
    }

    #[test]
    fn test_counts_states() {
        let out = StatusOutput::new(sample(), false);
        assert_eq!(out.applied, 1);
        assert_eq!(out.pending, 1);
        assert_eq!(out.migrations.len(), 2);
        assert!(out.to_human().contains("1 applied, 1 pending"));
    }

    #[test]
    fn test_pending_filter_keeps_totals() {
        let out = StatusOutput::new(sample(), true);
        assert_eq!(out.migrations.len(), 1);
        assert_eq!(out.migrations[0].version, 2);
        assert_eq!(out.applied, 1);

        let json = out.to_json();
        assert_eq!(json["migrations"][0]["state"], "pending");
    }
}
