use anyhow::Result;
use std::path::Path;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat, VectorDriver};
use crate::services::create_backend;

pub async fn handle_status(
    config_path: Option<&Path>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let config = Config::load_from(config_path)?;
    let formatter = get_formatter(format);

    if let Err(e) = config.validate() {
        eprintln!("Warning: {e}");
    }

    let (connected, info) =
        match create_backend(&config.vector_store, u64::from(config.embedding.dimension)).await {
            Ok(store) => {
                let connected = store.health_check().await.unwrap_or_else(|e| {
                    if verbose {
                        eprintln!("Health check failed: {e}");
                    }
                    false
                });
                let info = if connected {
                    store.index_info().await.ok().flatten()
                } else {
                    None
                };
                (connected, info)
            }
            Err(e) => {
                if verbose {
                    eprintln!("Could not create vector store client: {e}");
                }
                (false, None)
            }
        };

    let status = StatusInfo {
        embedding_model: config.embedding.model.clone(),
        embedding_dimension: config.embedding.dimension,
        embedding_url: config.embedding.url.clone(),
        vector_store_driver: config.vector_store.driver.to_string(),
        vector_store_url: config.vector_store.endpoint().to_string(),
        vector_store_connected: connected,
        index: config.vector_store.index.clone(),
        index_exists: info.is_some(),
        vector_count: info.as_ref().map_or(0, |i| i.vector_count),
    };

    print!("{}", formatter.format_status(&status));

    if !connected {
        eprintln!();
        match config.vector_store.driver {
            VectorDriver::Pinecone => {
                eprintln!("Warning: Pinecone not reachable. Check PINECONE_API_KEY and network.");
            }
            VectorDriver::Qdrant => {
                eprintln!("Warning: Qdrant not running. Start with: docker-compose up -d qdrant");
            }
        }
    } else if info.is_none() {
        eprintln!();
        eprintln!("Hint: index does not exist yet. It is created on first ingest.");
    }

    Ok(())
}
