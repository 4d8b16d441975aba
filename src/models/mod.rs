mod config;
mod filter;
mod project;
mod search;

pub use config::{
    Config, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL,
    DEFAULT_ENVIRONMENT, DEFAULT_INDEX_NAME, DEFAULT_PINECONE_URL, DEFAULT_QDRANT_URL,
    EmbeddingConfig, IngestConfig, SearchConfig, VectorDriver, VectorStoreConfig,
};
pub use filter::{FilterClause, Predicate, QueryFilter, SearchConstraints};
pub use project::{IndexRecord, NOT_JOINT, ProjectMetadata, ProjectRecord};
pub use search::{
    DEFAULT_TOP_K, OutputFormat, ScoredMatch, SearchQuery, SearchResult, SearchResults,
};
