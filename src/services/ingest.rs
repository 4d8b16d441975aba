//! Ingestion pipeline: normalize, embed in batches, upsert into the index.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::time::sleep;
use tracing::Instrument;

use super::embedding::EmbeddingClient;
use super::vector_store::VectorStore;
use crate::error::IngestError;
use crate::models::{IndexRecord, IngestConfig, ProjectRecord};
use crate::utils::{RetryConfig, RetryResult, normalize_project_text, with_retry, with_retry_when};

/// Counters describing one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Records read from the input
    pub total: u64,
    /// Records without a project number
    pub skipped: u64,
    /// Records that received a vector
    pub embedded: u64,
    /// Records whose batch was dropped after exhausting embedding retries
    pub embed_failed: u64,
    /// Records written to the index
    pub upserted: u64,
    /// Records in upsert sub-batches that failed
    pub dropped: u64,
    pub embed_calls: u64,
    pub upsert_calls: u64,
    pub duration_ms: u64,
}

impl IngestReport {
    /// True when every valid record made it into the index.
    pub fn is_complete(&self) -> bool {
        self.embed_failed == 0 && self.dropped == 0
    }
}

/// Pairs a batch of records with the vectors returned for it, by position.
///
/// Fails when the service returned a different number of vectors than texts
/// submitted, or when a vector has the wrong length.
pub fn build_index_records(
    batch: &[&ProjectRecord],
    vectors: Vec<Vec<f32>>,
    dimension: usize,
) -> Result<Vec<IndexRecord>, IngestError> {
    if vectors.len() != batch.len() {
        return Err(IngestError::EmbeddingCountMismatch {
            submitted: batch.len(),
            returned: vectors.len(),
        });
    }

    batch
        .iter()
        .zip(vectors)
        .map(|(record, values)| {
            let id = record.id().unwrap_or_default().to_string();
            if values.len() != dimension {
                return Err(IngestError::DimensionMismatch {
                    project_no: id,
                    expected: dimension,
                    actual: values.len(),
                });
            }
            Ok(IndexRecord {
                id,
                values,
                metadata: record.metadata(),
            })
        })
        .collect()
}

/// Turns project records into index entries.
///
/// Every external call is awaited in order; there is no parallel dispatch.
pub struct IngestionPipeline<'a> {
    embedder: &'a dyn EmbeddingClient,
    store: &'a dyn VectorStore,
    config: IngestConfig,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(
        embedder: &'a dyn EmbeddingClient,
        store: &'a dyn VectorStore,
        config: &IngestConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config: config.clone(),
        }
    }

    /// Ingest all records.
    pub async fn run(&self, records: &[ProjectRecord]) -> Result<IngestReport, IngestError> {
        self.run_with_progress(records, |_| {}).await
    }

    /// Ingest all records, calling `progress` with the size of each batch
    /// once the embedding phase is done with it.
    pub async fn run_with_progress<P>(
        &self,
        records: &[ProjectRecord],
        progress: P,
    ) -> Result<IngestReport, IngestError>
    where
        P: FnMut(u64),
    {
        let start = Instant::now();
        let mut report = IngestReport {
            total: records.len() as u64,
            ..Default::default()
        };

        let index_retry = RetryConfig::fixed(3, self.config.retry_backoff());
        with_retry(&index_retry, || self.store.ensure_index())
            .instrument(tracing::info_span!("ensure_index", index = self.store.index_name()))
            .await
            .into_result()?;

        let index_records = self.embed_records(records, &mut report, progress).await?;
        self.upsert_records(&index_records, &mut report).await;

        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            total = report.total,
            skipped = report.skipped,
            upserted = report.upserted,
            embed_failed = report.embed_failed,
            dropped = report.dropped,
            duration_ms = report.duration_ms,
            "ingestion finished"
        );
        Ok(report)
    }

    /// Embedding phase. Never touches the vector store.
    pub async fn embed_records<P>(
        &self,
        records: &[ProjectRecord],
        report: &mut IngestReport,
        mut progress: P,
    ) -> Result<Vec<IndexRecord>, IngestError>
    where
        P: FnMut(u64),
    {
        let mut valid: Vec<&ProjectRecord> = Vec::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if record.id().is_some() {
                valid.push(record);
            } else {
                tracing::warn!(position, title = %record.title, "record has no projectNo; skipping");
                report.skipped += 1;
            }
        }

        let batch_size = self.config.embed_batch_size.max(1) as usize;
        let retry_config =
            RetryConfig::fixed(self.config.max_embed_attempts, self.config.retry_backoff());
        let expected_dimension = self.embedder.dimension();
        let batch_count = valid.len().div_ceil(batch_size);
        let mut index_records = Vec::with_capacity(valid.len());

        for (batch_no, batch) in valid.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|r| normalize_project_text(r)).collect();
            let mut calls = 0u64;

            let span = tracing::info_span!("embed_batch", batch = batch_no + 1, size = batch.len());
            let outcome = with_retry_when(
                &retry_config,
                || {
                    calls += 1;
                    self.embedder.embed(&texts)
                },
                |_| true,
            )
            .instrument(span)
            .await;
            report.embed_calls += calls;

            match outcome {
                RetryResult::Success(vectors) => {
                    let built = build_index_records(batch, vectors, expected_dimension)?;
                    report.embedded += built.len() as u64;
                    index_records.extend(built);
                    tracing::info!(
                        batch = batch_no + 1,
                        batches = batch_count,
                        size = batch.len(),
                        "embedded batch"
                    );
                    progress(batch.len() as u64);

                    if batch_no + 1 < batch_count {
                        sleep(self.config.batch_pause()).await;
                    }
                }
                RetryResult::Failed {
                    last_error,
                    attempts,
                } => {
                    let first = batch.first().and_then(|r| r.id()).unwrap_or_default();
                    tracing::error!(
                        batch = batch_no + 1,
                        size = batch.len(),
                        first_project = first,
                        attempts,
                        "dropping batch after embedding failures: {last_error}"
                    );
                    report.embed_failed += batch.len() as u64;
                    progress(batch.len() as u64);
                }
            }
        }

        Ok(index_records)
    }

    /// Upsert phase. A failing batch is retried once in smaller sub-batches;
    /// sub-batches that still fail are dropped and counted.
    pub async fn upsert_records(&self, records: &[IndexRecord], report: &mut IngestReport) {
        let batch_size = self.config.upsert_batch_size.max(1) as usize;
        let retry_size = self.config.upsert_retry_batch_size.max(1) as usize;

        for batch in records.chunks(batch_size) {
            report.upsert_calls += 1;
            let error = match self.store.upsert(batch).await {
                Ok(()) => {
                    report.upserted += batch.len() as u64;
                    tracing::debug!(size = batch.len(), "upserted batch");
                    continue;
                }
                Err(e) => e,
            };

            tracing::warn!(
                size = batch.len(),
                retry_size,
                "upsert failed: {error}; retrying in sub-batches"
            );
            sleep(self.config.retry_backoff()).await;

            for sub_batch in batch.chunks(retry_size) {
                report.upsert_calls += 1;
                match self.store.upsert(sub_batch).await {
                    Ok(()) => report.upserted += sub_batch.len() as u64,
                    Err(e) => {
                        let ids: Vec<&str> = sub_batch.iter().map(|r| r.id.as_str()).collect();
                        tracing::error!(ids = ?ids, "dropping sub-batch: {e}");
                        report.dropped += sub_batch.len() as u64;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(no: &str) -> ProjectRecord {
        ProjectRecord {
            project_no: no.to_string(),
            title: format!("Project {no}"),
            ..Default::default()
        }
    }

    #[test]
    fn test_records_pair_with_vectors_by_position() {
        let a = record("A");
        let b = record("B");
        let built =
            build_index_records(&[&a, &b], vec![vec![1.0, 0.0], vec![0.0, 1.0]], 2).unwrap();

        assert_eq!(built[0].id, "A");
        assert_eq!(built[0].values, vec![1.0, 0.0]);
        assert_eq!(built[1].id, "B");
        assert_eq!(built[1].metadata.title, "Project B");
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        let a = record("A");
        let b = record("B");
        let err = build_index_records(&[&a, &b], vec![vec![1.0]], 1).unwrap_err();
        assert!(matches!(
            err,
            IngestError::EmbeddingCountMismatch {
                submitted: 2,
                returned: 1
            }
        ));
    }

    #[test]
    fn test_dimension_mismatch_is_fatal() {
        let a = record("A");
        let err = build_index_records(&[&a], vec![vec![1.0, 2.0, 3.0]], 2).unwrap_err();
        match err {
            IngestError::DimensionMismatch {
                project_no,
                expected,
                actual,
            } => {
                assert_eq!(project_no, "A");
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_report_completeness() {
        assert!(IngestReport::default().is_complete());
        let report = IngestReport {
            dropped: 3,
            ..Default::default()
        };
        assert!(!report.is_complete());
    }
}
