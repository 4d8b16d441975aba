//! Error types for the project finder.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding API key is not configured")]
    MissingApiKey,

    #[error("failed to connect to embedding service: {0}")]
    ConnectionError(String),

    #[error("embedding service rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("embedding service rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("embedding service error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_)
            | EmbeddingError::RateLimited(_)
            | EmbeddingError::Timeout => true,
            EmbeddingError::ServerError(msg) => {
                msg.contains("500")
                    || msg.contains("502")
                    || msg.contains("503")
                    || msg.contains("504")
                    || msg.to_lowercase().contains("unavailable")
            }
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::MissingApiKey
            | EmbeddingError::Unauthorized(_)
            | EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("vector store API key is not configured")]
    MissingApiKey,

    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("index error: {0}")]
    IndexError(String),

    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("invalid vector store response: {0}")]
    InvalidResponse(String),
}

impl Retryable for VectorStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            VectorStoreError::ConnectionError(_) => true,
            VectorStoreError::IndexError(msg)
            | VectorStoreError::UpsertError(msg)
            | VectorStoreError::QueryError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("unavailable")
                    || msg_lower.contains("too many")
                    || msg_lower.contains("429")
            }
            VectorStoreError::MissingApiKey
            | VectorStoreError::IndexNotFound(_)
            | VectorStoreError::InvalidResponse(_) => false,
        }
    }
}

/// Errors that abort an ingestion run.
///
/// Per-record validation problems and exhausted service retries never end up
/// here; they are logged and counted in the report instead.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("embedding service returned {returned} vectors for a batch of {submitted} texts")]
    EmbeddingCountMismatch { submitted: usize, returned: usize },

    #[error("vector for project {project_no} has dimension {actual}, index expects {expected}")]
    DimensionMismatch {
        project_no: String,
        expected: usize,
        actual: usize,
    },

    #[error("vector store error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("input error: {0}")]
    InputError(String),
}

/// Errors related to search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("query vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}
