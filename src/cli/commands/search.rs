use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

use super::connect;
use crate::cli::output::get_formatter;
use crate::models::{OutputFormat, SearchConstraints, SearchQuery};
use crate::services::QueryPipeline;

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(long, help = "Only projects in this category")]
    pub category: Option<String>,

    #[arg(long = "type", help = "Only projects of this type")]
    pub project_type: Option<String>,

    #[arg(long, help = "Only projects with this supervisor")]
    pub supervisor: Option<String>,

    #[arg(long, help = "Only joint or URECA projects")]
    pub joint: bool,

    #[arg(long, short = 'n', help = "Maximum number of results to return")]
    pub top: Option<u32>,

    #[arg(long, help = "Minimum similarity score threshold (-1.0 to 1.0)")]
    pub min_score: Option<f32>,
}

impl SearchArgs {
    fn constraints(&self) -> SearchConstraints {
        SearchConstraints {
            category: self.category.clone(),
            project_type: self.project_type.clone(),
            supervisor: self.supervisor.clone(),
            joint: self.joint,
        }
    }
}

pub async fn handle_search(
    args: SearchArgs,
    config_path: Option<&Path>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let (config, embedder, store) = connect(config_path).await?;
    let formatter = get_formatter(format);

    let top_k = args.top.unwrap_or(config.search.default_top_k);
    if top_k == 0 {
        anyhow::bail!("--top must be at least 1");
    }

    let min_score = args.min_score.or(config.search.default_min_score);
    if let Some(score) = min_score {
        if !(-1.0..=1.0).contains(&score) {
            anyhow::bail!("min_score must be between -1.0 and 1.0");
        }
    }

    let mut search_query = SearchQuery::new(query)
        .with_top_k(top_k)
        .with_constraints(args.constraints());
    if let Some(score) = min_score {
        search_query = search_query.with_min_score(score);
    }

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Top: {top_k}");
        eprintln!("  Filter: {}", search_query.constraints.to_filter());
        if let Some(score) = min_score {
            eprintln!("  Min score: {score:.3}");
        }
    }

    let pipeline = QueryPipeline::new(&embedder, store.as_ref());
    let results = pipeline
        .search(&search_query)
        .await
        .context("search failed")?;

    print!("{}", formatter.format_search_results(&results));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryFilter;

    #[test]
    fn test_constraints_from_args() {
        let args = SearchArgs {
            query: "robots".into(),
            category: Some("AI".into()),
            project_type: None,
            supervisor: Some("Dr. B".into()),
            joint: true,
            top: None,
            min_score: None,
        };
        let expected = QueryFilter::new()
            .eq("category", "AI")
            .eq("supervisor", "Dr. B")
            .ne("isJointOrURECA", "No");
        assert_eq!(args.constraints().to_filter(), expected);
    }
}
