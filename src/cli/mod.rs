//! Command-line interface.

pub mod commands;
pub mod display;
pub mod output;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use console::style;

use crate::adapters::sql::DatabaseError;
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

/// Top-level arguments.
#[derive(Parser, Debug)]
#[command(name = "schema-migrator")]
#[command(about = "Apply versioned SQL migrations to a relational database", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run; `run` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file to use instead of schema-migrator.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database URL, overriding config and environment
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Directory holding the migration scripts
    #[arg(long, global = true)]
    pub migrations_dir: Option<PathBuf>,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply every pending migration
    Run(commands::run::RunArgs),

    /// Show applied and pending migrations
    Status(commands::status::StatusArgs),

    /// Create the next numbered migration file
    New(commands::new::NewArgs),
}

impl Cli {
    /// Take the requested subcommand. A bare invocation applies pending
    /// migrations, like `run`.
    pub fn take_command(&mut self) -> Commands {
        self.command
            .take()
            .unwrap_or_else(|| Commands::Run(commands::run::RunArgs::default()))
    }
}

/// Resolve configuration: files and environment first, then command-line flags.
pub fn load_config(cli: &Cli) -> Result<Config> {
    if let Some(ref path) = cli.config {
        if !path.is_file() {
            bail!("Config file not found: {}", path.display());
        }
    }

    let mut figment = ConfigLoader::figment(cli.config.as_deref());
    if let Some(ref url) = cli.database_url {
        figment = figment.merge(("database.url", url));
    }
    if let Some(ref dir) = cli.migrations_dir {
        figment = figment.merge(("migrations.directory", dir));
    }

    ConfigLoader::extract(figment)
}

/// Report `err` and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let failed_migration = err
        .downcast_ref::<DatabaseError>()
        .and_then(|e| match e {
            DatabaseError::Migration(m) => m.failed_filename(),
            DatabaseError::Connection(_) => None,
        })
        .map(ToString::to_string);

    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
            "failed_migration": failed_migration,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
        if let Some(filename) = failed_migration {
            eprintln!("{} {filename}", style("failed migration:").dim());
        }
    }

    std::process::exit(1);
}
