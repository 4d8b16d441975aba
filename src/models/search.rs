//! Search-related models for queries and results.

use serde::{Deserialize, Serialize};

use super::filter::SearchConstraints;
use super::project::ProjectMetadata;

/// Default number of results returned by a search.
pub const DEFAULT_TOP_K: u32 = 20;

/// Output format for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// User's search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Natural language query text
    pub query: String,

    /// Structured metadata constraints (AND logic)
    pub constraints: SearchConstraints,

    /// Maximum results to return
    pub top_k: u32,

    /// Minimum similarity threshold
    pub min_score: Option<f32>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            constraints: SearchConstraints::default(),
            top_k: DEFAULT_TOP_K,
            min_score: None,
        }
    }
}

impl SearchQuery {
    /// Create a new search query with the given text.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set the result limit.
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the metadata constraints.
    pub fn with_constraints(mut self, constraints: SearchConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Set the minimum score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }
}

/// A raw match as returned by a vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f32,
    pub metadata: ProjectMetadata,
}

/// A single search result.
///
/// `projectNo` and `score` always come from the match; metadata is kept in
/// its own typed field and flattened only when serialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "projectNo")]
    pub project_no: String,

    /// Cosine similarity (-1.0..=1.0)
    pub score: f32,

    #[serde(flatten)]
    pub metadata: ProjectMetadata,
}

impl From<ScoredMatch> for SearchResult {
    fn from(m: ScoredMatch) -> Self {
        Self {
            project_no: m.id,
            score: m.score,
            metadata: m.metadata,
        }
    }
}

/// Collection of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Query that was executed
    pub query: String,

    /// Matching results, best first
    pub results: Vec<SearchResult>,

    /// Number of results returned
    pub total: u64,

    /// Query execution time in milliseconds
    pub duration_ms: u64,
}

impl SearchResults {
    /// Create a new search results container.
    pub fn new(query: String, results: Vec<SearchResult>, duration_ms: u64) -> Self {
        let total = results.len() as u64;
        Self {
            query,
            results,
            total,
            duration_ms,
        }
    }

    /// Check if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Get the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }
}
