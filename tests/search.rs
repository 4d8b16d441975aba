mod common;

use common::{FakeEmbedder, FakeStore, catalog, instant_config};
use project_finder::error::SearchError;
use project_finder::models::{SearchConstraints, SearchQuery};
use project_finder::services::{IngestionPipeline, QueryPipeline};

async fn seeded_store() -> FakeStore {
    let store = FakeStore::new();
    let embedder = FakeEmbedder::new();
    IngestionPipeline::new(&embedder, &store, &instant_config())
        .run(&catalog())
        .await
        .unwrap();
    store
}

fn ids(results: &project_finder::models::SearchResults) -> Vec<&str> {
    results.results.iter().map(|r| r.project_no.as_str()).collect()
}

#[tokio::test]
async fn test_best_match_comes_first() {
    let store = seeded_store().await;
    let embedder = FakeEmbedder::new();
    let pipeline = QueryPipeline::new(&embedder, &store);

    let results = pipeline
        .search(&SearchQuery::new("robot control"))
        .await
        .unwrap();

    assert_eq!(results.total, 4);
    let ranked = ids(&results);
    assert!(ranked[..2].contains(&"P1"));
    assert!(ranked[..2].contains(&"P4"));
    assert_eq!(results.results[0].metadata.category, "AI");
    assert!(results.results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_joint_filter_excludes_plain_projects() {
    let store = seeded_store().await;
    let embedder = FakeEmbedder::new();
    let pipeline = QueryPipeline::new(&embedder, &store);

    let query = SearchQuery::new("robot").with_constraints(SearchConstraints {
        joint: true,
        ..Default::default()
    });
    let results = pipeline.search(&query).await.unwrap();

    let mut found = ids(&results);
    found.sort_unstable();
    assert_eq!(found, vec!["P2", "P3"]);
    assert!(
        results
            .results
            .iter()
            .all(|r| r.metadata.is_joint_or_ureca != "No")
    );
}

#[tokio::test]
async fn test_constraints_combine_with_and() {
    let store = seeded_store().await;
    let embedder = FakeEmbedder::new();
    let pipeline = QueryPipeline::new(&embedder, &store);

    let query = SearchQuery::new("robot").with_constraints(SearchConstraints {
        category: Some("AI".into()),
        project_type: Some("FYP".into()),
        ..Default::default()
    });
    let mut found = ids(&pipeline.search(&query).await.unwrap())
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    found.sort_unstable();

    assert_eq!(found, vec!["P1", "P2"]);
}

#[tokio::test]
async fn test_no_matches_is_empty_not_error() {
    let store = seeded_store().await;
    let embedder = FakeEmbedder::new();
    let pipeline = QueryPipeline::new(&embedder, &store);

    let query = SearchQuery::new("robot").with_constraints(SearchConstraints {
        supervisor: Some("Nobody".into()),
        ..Default::default()
    });
    let results = pipeline.search(&query).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(results.total, 0);
}

#[tokio::test]
async fn test_top_k_limits_results() {
    let store = seeded_store().await;
    let embedder = FakeEmbedder::new();
    let pipeline = QueryPipeline::new(&embedder, &store);

    let results = pipeline
        .search(&SearchQuery::new("robot").with_top_k(2))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_min_score_drops_weak_matches() {
    let store = seeded_store().await;
    let embedder = FakeEmbedder::new();
    let pipeline = QueryPipeline::new(&embedder, &store);

    let results = pipeline
        .search(&SearchQuery::new("web portal design").with_min_score(0.99))
        .await
        .unwrap();

    assert_eq!(ids(&results), vec!["P3"]);
}

#[tokio::test]
async fn test_query_text_is_trimmed_and_required() {
    let store = FakeStore::new();
    let embedder = FakeEmbedder::new();
    let pipeline = QueryPipeline::new(&embedder, &store);

    let err = pipeline.search(&SearchQuery::new("   ")).await.unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery(_)));

    let err = pipeline
        .search(&SearchQuery::new("robot").with_top_k(0))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery(_)));
    assert_eq!(embedder.call_count(), 0);

    let results = pipeline.search(&SearchQuery::new("  robot ")).await.unwrap();
    assert_eq!(results.query, "robot");
    assert_eq!(embedder.calls.lock().unwrap()[0], vec!["robot".to_string()]);
}

#[tokio::test]
async fn test_embedding_failure_is_not_retried() {
    let store = seeded_store().await;
    let embedder = FakeEmbedder::failing();
    let pipeline = QueryPipeline::new(&embedder, &store);

    let err = pipeline
        .search(&SearchQuery::new("robot"))
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::EmbeddingError(_)));
    assert_eq!(embedder.call_count(), 1);
}

#[tokio::test]
async fn test_store_failure_is_surfaced() {
    let store = FakeStore {
        fail_queries: true,
        ..Default::default()
    };
    let embedder = FakeEmbedder::new();
    let pipeline = QueryPipeline::new(&embedder, &store);

    let err = pipeline
        .search(&SearchQuery::new("robot"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::VectorStoreError(_)));
}
