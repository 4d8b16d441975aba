use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::search::{DEFAULT_TOP_K, OutputFormat};
use crate::error::ConfigError;

pub const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 1536;
pub const DEFAULT_PINECONE_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_INDEX_NAME: &str = "project-finder-index";
pub const DEFAULT_ENVIRONMENT: &str = "gcp-starter";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("project-finder").join("config.toml"))
    }

    /// Load the config file (if any), then apply `.env` and environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`Config::load`], reading `path` instead of the default location.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::read_file(&path)?,
                _ => Self::default(),
            },
        };

        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load and validate in one step; used by every command that talks to a service.
    pub fn load_validated(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::load_from(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay environment variables on top of file values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.embedding.api_key = Some(v);
        }
        if let Some(v) = get("EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(v) = get("EMBEDDING_URL") {
            self.embedding.url = v;
        }
        if let Some(v) = get("EMBEDDING_DIMENSION") {
            self.embedding.dimension = v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "EMBEDDING_DIMENSION",
                reason: format!("expected a positive integer, got {v:?}"),
            })?;
        }
        if let Some(v) = get("VECTOR_DRIVER") {
            self.vector_store.driver = v.parse().map_err(|reason| ConfigError::Invalid {
                key: "VECTOR_DRIVER",
                reason,
            })?;
        }
        if let Some(v) = get("INDEX_NAME") {
            self.vector_store.index = v;
        }
        if let Some(v) = get("PINECONE_ENVIRONMENT") {
            self.vector_store.environment = v;
        }
        match self.vector_store.driver {
            VectorDriver::Pinecone => {
                if let Some(v) = get("PINECONE_API_KEY") {
                    self.vector_store.api_key = Some(v);
                }
            }
            VectorDriver::Qdrant => {
                if let Some(v) = get("QDRANT_API_KEY") {
                    self.vector_store.api_key = Some(v);
                }
                if let Some(v) = get("QDRANT_URL") {
                    self.vector_store.url = Some(v);
                }
            }
        }
        Ok(())
    }

    /// Check that everything needed to reach both services is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn blank(value: &str) -> bool {
            value.trim().is_empty()
        }

        if self.embedding.api_key.as_deref().is_none_or(blank) {
            return Err(ConfigError::Missing("OPENAI_API_KEY"));
        }
        if blank(&self.embedding.model) {
            return Err(ConfigError::Missing("EMBEDDING_MODEL"));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::Invalid {
                key: "embedding.dimension",
                reason: "must be greater than zero".to_string(),
            });
        }
        if blank(&self.vector_store.index) {
            return Err(ConfigError::Missing("INDEX_NAME"));
        }
        match self.vector_store.driver {
            VectorDriver::Pinecone => {
                if self.vector_store.api_key.as_deref().is_none_or(blank) {
                    return Err(ConfigError::Missing("PINECONE_API_KEY"));
                }
                if blank(&self.vector_store.environment) {
                    return Err(ConfigError::Missing("PINECONE_ENVIRONMENT"));
                }
            }
            VectorDriver::Qdrant => {}
        }
        self.ingest.validate()?;
        if self.search.default_top_k == 0 {
            return Err(ConfigError::Invalid {
                key: "search.default_top_k",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimension")]
    pub dimension: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Only ever read from the environment or the file; never written back.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_dimension() -> u32 {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_timeout() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            timeout_secs: default_timeout(),
            api_key: None,
        }
    }
}

/// Which hosted vector store backs the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDriver {
    #[default]
    Pinecone,
    Qdrant,
}

impl std::str::FromStr for VectorDriver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pinecone" => Ok(VectorDriver::Pinecone),
            "qdrant" => Ok(VectorDriver::Qdrant),
            other => Err(format!("unknown vector driver: {other}")),
        }
    }
}

impl std::fmt::Display for VectorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorDriver::Pinecone => write!(f, "pinecone"),
            VectorDriver::Qdrant => write!(f, "qdrant"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub driver: VectorDriver,

    #[serde(default = "default_index_name")]
    pub index: String,

    /// Pinecone project environment (informational for serverless indexes).
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_cloud")]
    pub cloud: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Pinecone control-plane URL, or the Qdrant gRPC URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Pinecone data-plane host; resolved from the index description when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_index_name() -> String {
    DEFAULT_INDEX_NAME.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

fn default_cloud() -> String {
    "gcp".to_string()
}

fn default_region() -> String {
    "us-central1".to_string()
}

fn default_store_timeout() -> u64 {
    30
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            driver: VectorDriver::default(),
            index: default_index_name(),
            environment: default_environment(),
            cloud: default_cloud(),
            region: default_region(),
            url: None,
            host: None,
            namespace: None,
            timeout_secs: default_store_timeout(),
            api_key: None,
        }
    }
}

impl VectorStoreConfig {
    /// URL of the backend's API, falling back to the driver's default.
    pub fn endpoint(&self) -> &str {
        match (&self.url, self.driver) {
            (Some(url), _) => url.as_str(),
            (None, VectorDriver::Pinecone) => DEFAULT_PINECONE_URL,
            (None, VectorDriver::Qdrant) => DEFAULT_QDRANT_URL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: u32,

    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: u32,

    #[serde(default = "default_upsert_retry_batch_size")]
    pub upsert_retry_batch_size: u32,

    #[serde(default = "default_max_embed_attempts")]
    pub max_embed_attempts: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,
}

fn default_embed_batch_size() -> u32 {
    50
}

fn default_upsert_batch_size() -> u32 {
    100
}

fn default_upsert_retry_batch_size() -> u32 {
    10
}

fn default_max_embed_attempts() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    5000
}

fn default_batch_pause_ms() -> u64 {
    500
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            embed_batch_size: default_embed_batch_size(),
            upsert_batch_size: default_upsert_batch_size(),
            upsert_retry_batch_size: default_upsert_retry_batch_size(),
            max_embed_attempts: default_max_embed_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            batch_pause_ms: default_batch_pause_ms(),
        }
    }
}

impl IngestConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("ingest.embed_batch_size", self.embed_batch_size),
            ("ingest.upsert_batch_size", self.upsert_batch_size),
            ("ingest.upsert_retry_batch_size", self.upsert_retry_batch_size),
            ("ingest.max_embed_attempts", self.max_embed_attempts),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: u32,

    #[serde(default)]
    pub default_format: OutputFormat,

    #[serde(default)]
    pub default_min_score: Option<f32>,
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            default_format: OutputFormat::Text,
            default_min_score: None,
        }
    }
}
