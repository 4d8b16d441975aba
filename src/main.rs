use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use project_finder::cli::commands::{
    handle_config, handle_ingest, handle_search, handle_serve, handle_status,
};
use project_finder::cli::{Cli, Commands};
use project_finder::models::{Config, OutputFormat};
use project_finder::server::shutdown_signal;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "project_finder=debug,warn"
    } else {
        "project_finder=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();
    let format = cli.format.unwrap_or_else(|| {
        Config::load_from(config_path)
            .map(|c| c.search.default_format)
            .unwrap_or_default()
    });

    let result = match cli.command {
        // The server installs its own graceful shutdown handler.
        Commands::Serve(args) => handle_serve(args, config_path).await,
        command => {
            tokio::select! {
                result = run_command(command, config_path, format, cli.verbose) => result,
                _ = shutdown_signal() => {
                    eprintln!("\nInterrupted");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run_command(
    command: Commands,
    config_path: Option<&Path>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Search(args) => handle_search(args, config_path, format, verbose).await,
        Commands::Ingest(args) => handle_ingest(args, config_path, format, verbose).await,
        Commands::Status => handle_status(config_path, format, verbose).await,
        Commands::Config(cmd) => handle_config(cmd, config_path, format, verbose).await,
        Commands::Serve(args) => handle_serve(args, config_path).await,
    }
}
