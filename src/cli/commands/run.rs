//! Implementation of the `schema-migrator run` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::display::action_success;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{AppliedVersion, Config, MigrationReport};
use crate::services::run_migrations;

/// Arguments of `run`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Skip the PostgreSQL advisory lock around the run
    #[arg(long)]
    pub no_lock: bool,
}

/// Output of `run`.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    /// Always true; failures exit through the error path.
    pub success: bool,
    /// Migrations applied by this run.
    pub applied: Vec<AppliedVersion>,
    /// Migrations already applied before the run.
    pub skipped: usize,
    /// Run duration.
    pub elapsed_ms: u128,
}

impl From<MigrationReport> for RunOutput {
    fn from(report: MigrationReport) -> Self {
        Self {
            success: true,
            applied: report.applied,
            skipped: report.skipped,
            elapsed_ms: report.elapsed_ms,
        }
    }
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        if self.applied.is_empty() {
            return format!("Database is up to date ({} migration(s) already applied).", self.skipped);
        }

        let mut lines: Vec<String> = self
            .applied
            .iter()
            .map(|m| action_success(&format!("Applied {}", m.filename)))
            .collect();
        lines.push(format!(
            "\n{} migration(s) applied in {}ms, {} already applied.",
            self.applied.len(),
            self.elapsed_ms,
            self.skipped
        ));
        lines.join("\n")
    }
}

/// Apply every pending migration and print the report.
pub async fn execute(args: RunArgs, mut config: Config, json_mode: bool) -> Result<()> {
    if args.no_lock {
        config.migrations.advisory_lock = false;
    }

    let report = run_migrations(&config).await?;
    output(&RunOutput::from(report), json_mode);
    Ok(())
}
