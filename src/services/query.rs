//! Query pipeline: embed the query, filter by metadata, rank by similarity.

use std::time::Instant;

use super::embedding::EmbeddingClient;
use super::vector_store::VectorStore;
use crate::error::SearchError;
use crate::models::{SearchQuery, SearchResult, SearchResults};

pub struct QueryPipeline<'a> {
    embedder: &'a dyn EmbeddingClient,
    store: &'a dyn VectorStore,
}

impl<'a> QueryPipeline<'a> {
    pub fn new(embedder: &'a dyn EmbeddingClient, store: &'a dyn VectorStore) -> Self {
        Self { embedder, store }
    }

    /// Run a search.
    ///
    /// Results keep the order the store returned them in. Embedding failures
    /// are surfaced to the caller without retrying.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
        let start = Instant::now();

        let text = query.query.trim();
        if text.is_empty() {
            return Err(SearchError::InvalidQuery("query must not be empty".to_string()));
        }
        if query.top_k == 0 {
            return Err(SearchError::InvalidQuery(
                "top_k must be at least 1".to_string(),
            ));
        }

        let vector = self.embedder.embed_one(text).await?;
        let expected = self.embedder.dimension();
        if vector.len() != expected {
            return Err(SearchError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let filter = query.constraints.to_filter();
        tracing::debug!(query = text, filter = %filter, top_k = query.top_k, "querying index");

        let matches = self.store.query(vector, &filter, query.top_k).await?;

        let results: Vec<SearchResult> = matches
            .into_iter()
            .filter(|m| query.min_score.is_none_or(|min| m.score >= min))
            .map(SearchResult::from)
            .collect();

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(results = results.len(), duration_ms, "search finished");

        Ok(SearchResults::new(text.to_string(), results, duration_ms))
    }
}
