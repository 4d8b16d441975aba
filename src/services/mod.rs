mod embedding;
mod ingest;
mod query;
mod vector_store;

pub use embedding::{EmbeddingClient, OpenAiEmbeddingClient};
pub use ingest::{IngestReport, IngestionPipeline, build_index_records};
pub use query::QueryPipeline;
pub use vector_store::{IndexInfo, PineconeBackend, QdrantBackend, VectorStore, create_backend};
