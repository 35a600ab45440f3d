//! Curator CLI - controlled-vocabulary correction for tabular metadata.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use curator::CuratorConfig;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => match CuratorConfig::load(path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => CuratorConfig::default(),
    };

    let result = match cli.command {
        Commands::Check {
            file,
            schema,
            column,
            json,
        } => commands::check::run(file, schema, column, json, config, cli.verbose),

        Commands::Review {
            file,
            schema,
            session,
            plan,
        } => commands::review::run(file, schema, session, plan, config),

        Commands::Batch {
            file,
            min_confidence,
            column,
            reject_rest,
        } => commands::batch::run(file, min_confidence, column, reject_rest, cli.verbose),

        Commands::Status { file, json } => commands::status::run(file, json, cli.verbose),

        Commands::Approve { file, output } => commands::approve::run(file, output),

        Commands::Apply {
            file,
            table,
            output,
            concurrency,
            json,
        } => commands::apply::run(file, table, output, concurrency, json, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
