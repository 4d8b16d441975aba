//! In-memory doubles for the embedding service and the vector store.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use project_finder::error::{EmbeddingError, VectorStoreError};
use project_finder::models::{IndexRecord, IngestConfig, ProjectRecord, QueryFilter, ScoredMatch};
use project_finder::services::{EmbeddingClient, IndexInfo, VectorStore};

pub const DIMENSION: usize = 16;

/// Bag-of-words vector: each word adds 1.0 to the bucket picked by its byte sum.
pub fn bag_of_words(text: &str, dimension: usize) -> Vec<f32> {
    let mut values = vec![0.0; dimension];
    for word in text.split_whitespace() {
        let bucket = word.bytes().map(usize::from).sum::<usize>() % dimension;
        values[bucket] += 1.0;
    }
    values
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[derive(Default)]
pub struct FakeEmbedder {
    /// Texts of every call, including failed ones.
    pub calls: Mutex<Vec<Vec<String>>>,
    /// Number of upcoming calls that fail.
    pub failures_left: Mutex<u32>,
    /// Every call fails.
    pub always_fail: bool,
    /// Return one vector fewer than requested.
    pub drop_one: bool,
    /// Return vectors one element too long.
    pub wrong_dimension: bool,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Default::default()
        }
    }

    pub fn failing_first(n: u32) -> Self {
        Self {
            failures_left: Mutex::new(n),
            ..Default::default()
        }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl EmbeddingClient for FakeEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.lock().unwrap().push(texts.to_vec());

        if self.always_fail {
            return Err(EmbeddingError::ServerError("status 503: unavailable".into()));
        }
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(EmbeddingError::RateLimited("slow down".into()));
            }
        }

        let len = if self.wrong_dimension {
            DIMENSION + 1
        } else {
            DIMENSION
        };
        let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| bag_of_words(t, len)).collect();
        if self.drop_one {
            vectors.pop();
        }
        Ok(vectors)
    }

    fn model(&self) -> &str {
        "fake-bag-of-words"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub records: Mutex<BTreeMap<String, IndexRecord>>,
    pub upsert_sizes: Mutex<Vec<usize>>,
    pub ensure_calls: Mutex<u32>,
    /// Upserts larger than this fail.
    pub max_upsert: Option<usize>,
    /// Upserts containing any of these ids fail.
    pub poisoned: HashSet<String>,
    /// Queries fail.
    pub fail_queries: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn get(&self, id: &str) -> Option<IndexRecord> {
        self.records.lock().unwrap().get(id).cloned()
    }

    pub fn upsert_sizes(&self) -> Vec<usize> {
        self.upsert_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn index_info(&self) -> Result<Option<IndexInfo>, VectorStoreError> {
        Ok(Some(IndexInfo {
            vector_count: self.len() as u64,
            dimension: Some(DIMENSION as u64),
        }))
    }

    async fn ensure_index(&self) -> Result<(), VectorStoreError> {
        *self.ensure_calls.lock().unwrap() += 1;
        Ok(())
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<(), VectorStoreError> {
        self.upsert_sizes.lock().unwrap().push(records.len());

        if self.max_upsert.is_some_and(|max| records.len() > max) {
            return Err(VectorStoreError::UpsertError("status 413: payload too large".into()));
        }
        if records.iter().any(|r| self.poisoned.contains(&r.id)) {
            return Err(VectorStoreError::UpsertError("status 400: bad vector".into()));
        }

        let mut stored = self.records.lock().unwrap();
        for record in records {
            stored.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        filter: &QueryFilter,
        top_k: u32,
    ) -> Result<Vec<ScoredMatch>, VectorStoreError> {
        if self.fail_queries {
            return Err(VectorStoreError::QueryError("status 500: internal".into()));
        }

        let stored = self.records.lock().unwrap();
        let mut matches: Vec<ScoredMatch> = stored
            .values()
            .filter(|r| filter.matches(&r.metadata))
            .map(|r| ScoredMatch {
                id: r.id.clone(),
                score: cosine(&vector, &r.values),
                metadata: r.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k as usize);
        Ok(matches)
    }

    fn index_name(&self) -> &str {
        "fake-index"
    }
}

/// Ingest settings with no waiting between attempts.
pub fn instant_config() -> IngestConfig {
    IngestConfig {
        retry_backoff_ms: 0,
        batch_pause_ms: 0,
        ..Default::default()
    }
}

pub fn project(no: &str, title: &str) -> ProjectRecord {
    ProjectRecord {
        project_no: no.to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}

/// A small catalog with a mix of categories, types and joint flags.
pub fn catalog() -> Vec<ProjectRecord> {
    let entry = |no: &str, title: &str, category: &str, kind: &str, joint: &str| ProjectRecord {
        project_no: no.to_string(),
        title: title.to_string(),
        supervisor: format!("Dr. {}", &no[1..]),
        category: category.to_string(),
        project_type: kind.to_string(),
        is_joint_or_ureca: joint.to_string(),
        ..Default::default()
    };
    vec![
        entry("P1", "robot arm control", "AI", "FYP", "No"),
        entry("P2", "vision object detection", "AI", "FYP", "URECA"),
        entry("P3", "web portal design", "Web", "FYP", "Joint"),
        entry("P4", "robot control planner", "AI", "URECA", "No"),
    ]
}
