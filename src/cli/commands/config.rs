use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a default configuration file")]
    Init {
        #[arg(long, short = 'f', help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show the effective configuration (credentials masked)")]
    Show,
    #[command(about = "Show the configuration file path")]
    Path,
}

pub async fn handle_config(
    cmd: ConfigCommand,
    config_path: Option<&Path>,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { force } => handle_init(config_path, force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(config_path, format),
        ConfigCommand::Path => handle_path(config_path),
    }
}

fn resolve_path(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory")),
    }
}

fn handle_init(config_path: Option<&Path>, force: bool, formatter: &dyn Formatter) -> Result<()> {
    let path = resolve_path(config_path)?;

    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    Config::default()
        .save(&path)
        .context("failed to write config")?;
    println!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}

fn credential_state(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if !v.trim().is_empty() => "********",
        _ => "(not set)",
    }
}

fn handle_show(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = Config::load_from(config_path)?;
    let embedding_key = credential_state(config.embedding.api_key.as_deref());
    let store_key = credential_state(config.vector_store.api_key.as_deref());

    if format == OutputFormat::Json {
        let output = serde_json::json!({
            "config": config,
            "credentials": {
                "embedding_api_key": embedding_key,
                "vector_store_api_key": store_key,
            },
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Ok(path) = resolve_path(config_path) {
        let state = if path.exists() { "" } else { " (not found, using defaults)" };
        println!("# Config file: {}{}", path.display(), state);
    }
    println!();
    print!("{}", toml::to_string_pretty(&config)?);
    println!();
    println!("# Credentials (from environment or .env)");
    println!("# embedding api_key = {embedding_key}");
    println!("# vector_store api_key = {store_key}");

    Ok(())
}

fn handle_path(config_path: Option<&Path>) -> Result<()> {
    let path = resolve_path(config_path)?;
    let state = if path.exists() { "active" } else { "would be" };
    println!("Config file ({state}): {}", path.display());

    if let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        let state = if env_path.exists() { "active" } else { "would be" };
        println!(".env file ({state}): {}", env_path.display());
    }

    Ok(())
}
