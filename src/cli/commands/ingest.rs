//! Ingest command implementation.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use super::connect;
use crate::cli::output::{IngestPreview, PreviewRecord, get_formatter};
use crate::models::{Config, OutputFormat, ProjectRecord};
use crate::services::IngestionPipeline;
use crate::utils::{load_projects, normalize_project_text};

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(required = true, help = "JSON file with an array of projects ('-' for stdin)")]
    pub file: PathBuf,

    #[arg(long, help = "Show what would be ingested without calling any service")]
    pub dry_run: bool,
}

pub async fn handle_ingest(
    args: IngestArgs,
    config_path: Option<&Path>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);
    let projects = load_projects(&args.file)
        .with_context(|| format!("failed to read projects from {}", args.file.display()))?;

    if verbose {
        eprintln!("Loaded {} records from {}", projects.len(), args.file.display());
    }

    if args.dry_run {
        let config = Config::load_from(config_path)?;
        let preview = build_preview(&projects, config.ingest.embed_batch_size);
        print!("{}", formatter.format_ingest_preview(&preview));
        return Ok(());
    }

    if projects.is_empty() {
        eprintln!("No projects found; only checking the index.");
    }

    let (config, embedder, store) = connect(config_path).await?;
    let pipeline = IngestionPipeline::new(&embedder, store.as_ref(), &config.ingest);

    let pb = if format == OutputFormat::Text {
        let pb = ProgressBar::new(projects.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .context("invalid progress template")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let skipped = projects.iter().filter(|p| p.id().is_none()).count() as u64;
    pb.inc(skipped);

    let report = pipeline
        .run_with_progress(&projects, |n| pb.inc(n))
        .await
        .context("ingestion aborted")?;
    pb.finish_and_clear();

    print!("{}", formatter.format_ingest_report(&report));

    if !report.is_complete() {
        anyhow::bail!(
            "{} of {} projects were not indexed",
            report.embed_failed + report.dropped,
            report.total - report.skipped
        );
    }

    Ok(())
}

fn build_preview(projects: &[ProjectRecord], embed_batch_size: u32) -> IngestPreview {
    let records: Vec<PreviewRecord> = projects
        .iter()
        .filter_map(|p| {
            p.id().map(|id| PreviewRecord {
                project_no: id.to_string(),
                text: normalize_project_text(p),
            })
        })
        .collect();

    IngestPreview {
        total: projects.len() as u64,
        skipped: (projects.len() - records.len()) as u64,
        embed_batches: records.len().div_ceil(embed_batch_size.max(1) as usize) as u64,
        records,
    }
}
