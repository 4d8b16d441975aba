//! Pinecone vector store backend (serverless indexes, REST API).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{IndexInfo, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{IndexRecord, ProjectMetadata, QueryFilter, ScoredMatch, VectorStoreConfig};

const API_VERSION: &str = "2024-07";
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);
const READY_POLL_ATTEMPTS: u32 = 60;

#[derive(Debug, Deserialize)]
struct IndexDescription {
    #[serde(default)]
    dimension: Option<u64>,
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: u64,
    metric: &'static str,
    spec: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    serverless: CloudRegion<'a>,
}

#[derive(Debug, Serialize)]
struct CloudRegion<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [IndexRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: Vec<f32>,
    top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    total_vector_count: u64,
    #[serde(default)]
    dimension: Option<u64>,
}

/// Pinecone vector store backend.
pub struct PineconeBackend {
    client: Client,
    control_url: String,
    api_key: String,
    index: String,
    dimension: u64,
    cloud: String,
    region: String,
    namespace: Option<String>,
    host: OnceCell<String>,
}

impl PineconeBackend {
    /// Create a new Pinecone backend for vectors of `dimension` length.
    pub fn new(config: &VectorStoreConfig, dimension: u64) -> Result<Self, VectorStoreError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(VectorStoreError::MissingApiKey)?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        let host = OnceCell::new();
        if let Some(configured) = config.host.as_deref().filter(|h| !h.trim().is_empty()) {
            let _ = host.set(data_plane_url(configured));
        }

        Ok(Self {
            client,
            control_url: config.endpoint().trim_end_matches('/').to_string(),
            api_key,
            index: config.index.clone(),
            dimension,
            cloud: config.cloud.clone(),
            region: config.region.clone(),
            namespace: config.namespace.clone().filter(|n| !n.is_empty()),
            host,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn send(request: RequestBuilder) -> Result<Response, VectorStoreError> {
        request
            .send()
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn error_body(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("status {}: {}", status, body)
    }

    async fn describe_index(&self) -> Result<Option<IndexDescription>, VectorStoreError> {
        let url = format!("{}/indexes/{}", self.control_url, self.index);
        let response = Self::send(self.authorized(self.client.get(&url))).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json()
                .await
                .map(Some)
                .map_err(|e| VectorStoreError::InvalidResponse(e.to_string())),
            _ => Err(VectorStoreError::IndexError(Self::error_body(response).await)),
        }
    }

    /// Data-plane URL of the index, resolved once from its description.
    async fn data_url(&self) -> Result<&str, VectorStoreError> {
        self.host
            .get_or_try_init(|| async {
                let description = self
                    .describe_index()
                    .await?
                    .ok_or_else(|| VectorStoreError::IndexNotFound(self.index.clone()))?;
                Ok::<_, VectorStoreError>(data_plane_url(&description.host))
            })
            .await
            .map(String::as_str)
    }

    async fn stats(&self) -> Result<IndexStats, VectorStoreError> {
        let url = format!("{}/describe_index_stats", self.data_url().await?);
        let request = self
            .authorized(self.client.post(&url))
            .json(&serde_json::json!({}));
        let response = Self::send(request).await?;

        if !response.status().is_success() {
            return Err(VectorStoreError::IndexError(Self::error_body(response).await));
        }
        response
            .json()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))
    }

    async fn wait_until_ready(&self) -> Result<(), VectorStoreError> {
        for _ in 0..READY_POLL_ATTEMPTS {
            let ready = self
                .describe_index()
                .await?
                .is_some_and(|d| d.status.ready);
            if ready {
                return Ok(());
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
        Err(VectorStoreError::IndexError(format!(
            "index {} not ready after {}s",
            self.index,
            READY_POLL_ATTEMPTS as u64 * READY_POLL_INTERVAL.as_secs()
        )))
    }
}

fn data_plane_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn to_scored_match(m: Match) -> ScoredMatch {
    let metadata = match m.metadata {
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(id = %m.id, "unreadable metadata: {e}");
            ProjectMetadata::default()
        }),
        None => ProjectMetadata::default(),
    };
    ScoredMatch {
        id: m.id,
        score: m.score,
        metadata,
    }
}

#[async_trait]
impl VectorStore for PineconeBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        let url = format!("{}/indexes", self.control_url);
        let response = Self::send(self.authorized(self.client.get(&url))).await?;
        Ok(response.status().is_success())
    }

    async fn index_info(&self) -> Result<Option<IndexInfo>, VectorStoreError> {
        let Some(description) = self.describe_index().await? else {
            return Ok(None);
        };
        let _ = self.host.set(data_plane_url(&description.host));
        let stats = self.stats().await?;
        Ok(Some(IndexInfo {
            vector_count: stats.total_vector_count,
            dimension: stats.dimension.or(description.dimension),
        }))
    }

    async fn ensure_index(&self) -> Result<(), VectorStoreError> {
        if let Some(description) = self.describe_index().await? {
            if let Some(existing) = description.dimension.filter(|&d| d != self.dimension) {
                return Err(VectorStoreError::IndexError(format!(
                    "index {} has dimension {existing}, embeddings have {}",
                    self.index, self.dimension
                )));
            }
            let _ = self.host.set(data_plane_url(&description.host));
            return Ok(());
        }

        tracing::info!(index = %self.index, dimension = self.dimension, "creating Pinecone index");
        let url = format!("{}/indexes", self.control_url);
        let body = CreateIndexRequest {
            name: &self.index,
            dimension: self.dimension,
            metric: "cosine",
            spec: ServerlessSpec {
                serverless: CloudRegion {
                    cloud: &self.cloud,
                    region: &self.region,
                },
            },
        };
        let response = Self::send(self.authorized(self.client.post(&url)).json(&body)).await?;

        // 409: created concurrently by someone else.
        if !response.status().is_success() && response.status() != StatusCode::CONFLICT {
            return Err(VectorStoreError::IndexError(Self::error_body(response).await));
        }

        self.wait_until_ready().await
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let url = format!("{}/vectors/upsert", self.data_url().await?);
        let body = UpsertRequest {
            vectors: records,
            namespace: self.namespace.as_deref(),
        };
        let response = Self::send(self.authorized(self.client.post(&url)).json(&body)).await?;

        if !response.status().is_success() {
            return Err(VectorStoreError::UpsertError(Self::error_body(response).await));
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        filter: &QueryFilter,
        top_k: u32,
    ) -> Result<Vec<ScoredMatch>, VectorStoreError> {
        let url = format!("{}/query", self.data_url().await?);
        let body = QueryRequest {
            vector,
            top_k,
            filter: filter.to_pinecone(),
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };
        let response = Self::send(self.authorized(self.client.post(&url)).json(&body)).await?;

        if !response.status().is_success() {
            return Err(VectorStoreError::QueryError(Self::error_body(response).await));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;

        Ok(parsed.matches.into_iter().map(to_scored_match).collect())
    }

    fn index_name(&self) -> &str {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_plane_url() {
        assert_eq!(
            data_plane_url("idx-abc.svc.gcp-starter.pinecone.io"),
            "https://idx-abc.svc.gcp-starter.pinecone.io"
        );
        assert_eq!(data_plane_url("http://localhost:5081/"), "http://localhost:5081");
    }

    #[test]
    fn test_configured_host_skips_lookup() {
        let config = VectorStoreConfig {
            api_key: Some("pc-test".into()),
            host: Some("idx.pinecone.io".into()),
            ..Default::default()
        };
        let backend = PineconeBackend::new(&config, 4).unwrap();
        assert_eq!(
            backend.host.get().map(String::as_str),
            Some("https://idx.pinecone.io")
        );
    }

    #[test]
    fn test_upsert_body_shape() {
        let records = vec![IndexRecord {
            id: "P1".into(),
            values: vec![0.5, 0.25],
            metadata: ProjectMetadata {
                title: "Vision".into(),
                ..Default::default()
            },
        }];
        let body = serde_json::to_value(UpsertRequest {
            vectors: &records,
            namespace: None,
        })
        .unwrap();
        assert_eq!(body["vectors"][0]["id"], "P1");
        assert_eq!(body["vectors"][0]["values"], json!([0.5, 0.25]));
        assert_eq!(body["vectors"][0]["metadata"]["isJointOrURECA"], "No");
        assert!(body.get("namespace").is_none());
    }

    #[test]
    fn test_query_body_shape() {
        let filter = QueryFilter::new().ne("isJointOrURECA", "No");
        let body = serde_json::to_value(QueryRequest {
            vector: vec![1.0],
            top_k: 20,
            filter: filter.to_pinecone(),
            include_metadata: true,
            include_values: false,
            namespace: Some("prod"),
        })
        .unwrap();
        assert_eq!(body["topK"], 20);
        assert_eq!(body["includeMetadata"], true);
        assert_eq!(body["filter"], json!({"isJointOrURECA": {"$ne": "No"}}));
        assert_eq!(body["namespace"], "prod");
    }

    #[test]
    fn test_query_without_filter_omits_field() {
        let body = serde_json::to_value(QueryRequest {
            vector: vec![1.0],
            top_k: 5,
            filter: QueryFilter::new().to_pinecone(),
            include_metadata: true,
            include_values: false,
            namespace: None,
        })
        .unwrap();
        assert!(body.get("filter").is_none());
    }

    #[test]
    fn test_match_conversion() {
        let response: QueryResponse = serde_json::from_value(json!({
            "matches": [
                {"id": "P2", "score": 0.9, "metadata": {"title": "B", "keywords": ["x"]}},
                {"id": "P3", "score": 0.4}
            ],
            "namespace": ""
        }))
        .unwrap();
        let matches: Vec<ScoredMatch> = response.matches.into_iter().map(to_scored_match).collect();
        assert_eq!(matches[0].id, "P2");
        assert_eq!(matches[0].metadata.keywords, vec!["x"]);
        assert_eq!(matches[1].metadata, ProjectMetadata::default());
    }
}
