//! Implementation of the `schema-migrator new` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::display::action_success;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::services::create_migration;

/// Arguments of `new`.
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Short description, used to name the file
    #[arg(required = true, num_args = 1..)]
    pub description: Vec<String>,
}

/// Output of `new`.
#[derive(Debug, Serialize)]
pub struct NewOutput {
    /// Always true; failures exit through the error path.
    pub success: bool,
    /// Created file.
    pub path: PathBuf,
}

impl CommandOutput for NewOutput {
    fn to_human(&self) -> String {
        action_success(&format!("Created {}", self.path.display()))
    }
}

/// Create the next migration file in the configured directory.
pub async fn execute(args: NewArgs, config: Config, json_mode: bool) -> Result<()> {
    let description = args.description.join(" ");
    let path = create_migration(&config.migrations.directory, &description).await?;
    output(&NewOutput { success: true, path }, json_mode);
    Ok(())
}
