//! Vector store abstraction layer.
//!
//! This module provides a trait-based abstraction over the hosted vector
//! stores the index can live in (Pinecone, Qdrant), selected by configuration.

mod pinecone;
mod qdrant;

pub use pinecone::PineconeBackend;
pub use qdrant::QdrantBackend;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{IndexRecord, QueryFilter, ScoredMatch, VectorDriver, VectorStoreConfig};

/// Index information reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub vector_count: u64,
    pub dimension: Option<u64>,
}

/// Abstract trait for vector store operations.
///
/// All backends must implement this trait so the pipelines never depend on a
/// concrete store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the vector store is reachable.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Describe the configured index. Returns `None` if it doesn't exist.
    async fn index_info(&self) -> Result<Option<IndexInfo>, VectorStoreError>;

    /// Create the index (cosine metric, configured dimension) if it doesn't exist.
    async fn ensure_index(&self) -> Result<(), VectorStoreError>;

    /// Insert or replace records by id.
    async fn upsert(&self, records: &[IndexRecord]) -> Result<(), VectorStoreError>;

    /// Nearest neighbours of `vector` that pass `filter`, best first.
    async fn query(
        &self,
        vector: Vec<f32>,
        filter: &QueryFilter,
        top_k: u32,
    ) -> Result<Vec<ScoredMatch>, VectorStoreError>;

    /// Name of the index.
    fn index_name(&self) -> &str;
}

/// Create a vector store backend for vectors of `dimension` length.
pub async fn create_backend(
    config: &VectorStoreConfig,
    dimension: u64,
) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    match config.driver {
        VectorDriver::Pinecone => {
            let backend = PineconeBackend::new(config, dimension)?;
            Ok(Box::new(backend))
        }
        VectorDriver::Qdrant => {
            let backend = QdrantBackend::new(config, dimension)?;
            Ok(Box::new(backend))
        }
    }
}
