//! Qdrant vector store backend implementation.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::{IndexInfo, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{
    IndexRecord, Predicate, ProjectMetadata, QueryFilter, ScoredMatch, VectorStoreConfig,
};

/// Payload key holding the original project number.
const PROJECT_NO_KEY: &str = "projectNo";

/// Qdrant vector store backend.
pub struct QdrantBackend {
    client: Qdrant,
    collection: String,
    dimension: u64,
}

impl QdrantBackend {
    /// Create a new Qdrant backend for vectors of `dimension` length.
    pub fn new(config: &VectorStoreConfig, dimension: u64) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(config.endpoint());

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.index.clone(),
            dimension,
        })
    }

    /// Qdrant ids must be integers or UUIDs, so project numbers map to a
    /// stable v5 UUID. The project number itself travels in the payload.
    pub fn point_id(project_no: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, project_no.as_bytes()).to_string()
    }

    fn build_filter(filter: &QueryFilter) -> Option<Filter> {
        if filter.is_empty() {
            return None;
        }

        let mut must = Vec::new();
        let mut must_not = Vec::new();
        for clause in filter.clauses() {
            match &clause.predicate {
                Predicate::Eq(value) => {
                    must.push(Condition::matches(clause.field.clone(), value.clone()))
                }
                Predicate::Ne(value) => {
                    must_not.push(Condition::matches(clause.field.clone(), value.clone()))
                }
            }
        }

        Some(Filter {
            must,
            must_not,
            ..Default::default()
        })
    }

    fn to_payload(record: &IndexRecord) -> HashMap<String, Value> {
        let metadata = &record.metadata;
        let mut payload: HashMap<String, Value> = HashMap::new();
        payload.insert(PROJECT_NO_KEY.to_string(), record.id.clone().into());
        payload.insert("title".to_string(), metadata.title.clone().into());
        payload.insert("supervisor".to_string(), metadata.supervisor.clone().into());
        payload.insert("category".to_string(), metadata.category.clone().into());
        payload.insert("type".to_string(), metadata.project_type.clone().into());
        payload.insert(
            "isJointOrURECA".to_string(),
            metadata.is_joint_or_ureca.clone().into(),
        );

        let keywords: Vec<Value> = metadata
            .keywords
            .iter()
            .map(|k| k.clone().into())
            .collect();
        payload.insert("keywords".to_string(), keywords.into());
        payload
    }

    fn from_payload(payload: &HashMap<String, Value>) -> (Option<String>, ProjectMetadata) {
        let text = |key: &str| -> Option<String> {
            match payload.get(key).and_then(|v| v.kind.as_ref()) {
                Some(Kind::StringValue(s)) => Some(s.clone()),
                _ => None,
            }
        };

        let keywords = match payload.get("keywords").and_then(|v| v.kind.as_ref()) {
            Some(Kind::ListValue(list)) => list
                .values
                .iter()
                .filter_map(|v| match &v.kind {
                    Some(Kind::StringValue(s)) => Some(s.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        let defaults = ProjectMetadata::default();
        let metadata = ProjectMetadata {
            title: text("title").unwrap_or_default(),
            supervisor: text("supervisor").unwrap_or_default(),
            category: text("category").unwrap_or_default(),
            project_type: text("type").unwrap_or_default(),
            keywords,
            is_joint_or_ureca: text("isJointOrURECA").unwrap_or(defaults.is_joint_or_ureca),
        };
        (text(PROJECT_NO_KEY), metadata)
    }
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn index_info(&self) -> Result<Option<IndexInfo>, VectorStoreError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;
        if !exists {
            return Ok(None);
        }

        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))?;

        let result = info.result;
        let vector_count = result
            .as_ref()
            .and_then(|r| r.points_count)
            .unwrap_or(0);
        let dimension = result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|config| match config {
                VectorsConfigKind::Params(params) => Some(params.size),
                VectorsConfigKind::ParamsMap(_) => None,
            });

        Ok(Some(IndexInfo {
            vector_count,
            dimension,
        }))
    }

    async fn ensure_index(&self) -> Result<(), VectorStoreError> {
        if let Some(info) = self.index_info().await? {
            if let Some(existing) = info.dimension.filter(|&d| d != self.dimension) {
                return Err(VectorStoreError::IndexError(format!(
                    "collection {} has dimension {existing}, embeddings have {}",
                    self.collection, self.dimension
                )));
            }
            return Ok(());
        }

        tracing::info!(collection = %self.collection, dimension = self.dimension, "creating Qdrant collection");
        let create_collection = CreateCollectionBuilder::new(&self.collection)
            .vectors_config(VectorParamsBuilder::new(self.dimension, Distance::Cosine));

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))?;

        Ok(())
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = records
            .iter()
            .map(|record| {
                PointStruct::new(
                    Self::point_id(&record.id),
                    record.values.clone(),
                    Self::to_payload(record),
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        filter: &QueryFilter,
        top_k: u32,
    ) -> Result<Vec<ScoredMatch>, VectorStoreError> {
        let mut search_builder =
            SearchPointsBuilder::new(&self.collection, vector, u64::from(top_k)).with_payload(true);

        if let Some(f) = Self::build_filter(filter) {
            search_builder = search_builder.filter(f);
        }

        let results = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| VectorStoreError::QueryError(e.to_string()))?;

        let matches = results
            .result
            .into_iter()
            .map(|point| {
                let (project_no, metadata) = Self::from_payload(&point.payload);
                ScoredMatch {
                    id: project_no.unwrap_or_default(),
                    score: point.score,
                    metadata,
                }
            })
            .collect();

        Ok(matches)
    }

    fn index_name(&self) -> &str {
        &self.collection
    }
}
