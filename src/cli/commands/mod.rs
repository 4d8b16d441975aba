mod config;
mod ingest;
mod search;
mod serve;
mod status;

pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use search::SearchArgs;
pub use serve::ServeArgs;

pub use config::handle_config;
pub use ingest::handle_ingest;
pub use search::handle_search;
pub use serve::handle_serve;
pub use status::handle_status;

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::Config;
use crate::services::{EmbeddingClient, OpenAiEmbeddingClient, VectorStore, create_backend};

/// Load and validate configuration, then build both adapters.
pub(crate) async fn connect(
    config_path: Option<&Path>,
) -> Result<(Config, OpenAiEmbeddingClient, Box<dyn VectorStore>)> {
    let config = Config::load_validated(config_path)?;
    let embedder =
        OpenAiEmbeddingClient::new(&config.embedding).context("failed to create embedding client")?;
    let store = create_backend(&config.vector_store, embedder.dimension() as u64)
        .await
        .context("failed to create vector store client")?;
    Ok((config, embedder, store))
}
