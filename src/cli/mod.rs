//! CLI module for the project finder.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::OutputFormat;

/// Semantic search over the project catalog.
#[derive(Debug, Parser)]
#[command(name = "pfind")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        short = 'c',
        global = true,
        env = "PFIND_CONFIG",
        help = "Path to config file (defaults to the user config directory)"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search projects by meaning, optionally filtered by metadata
    Search(commands::SearchArgs),

    /// Embed a JSON catalog of projects and upsert it into the index
    Ingest(commands::IngestArgs),

    /// Check embedding service and vector store status
    Status,

    /// Serve the search API over HTTP
    Serve(commands::ServeArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
