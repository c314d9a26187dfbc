//! Schema Migrator CLI entry point.

use clap::Parser;

use schema_migrator::cli::{self, Cli, Commands};
use schema_migrator::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();

    let config = match cli::load_config(&cli) {
        Ok(config) => config,
        Err(err) => cli::handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => cli::handle_error(err, cli.json),
    };

    let result = match cli.take_command() {
        Commands::Run(args) => cli::commands::run::execute(args, config, cli.json).await,
        Commands::Status(args) => cli::commands::status::execute(args, config, cli.json).await,
        Commands::New(args) => cli::commands::new::execute(args, config, cli.json).await,
    };

    if let Err(err) = result {
        cli::handle_error(err, cli.json);
    }
}
