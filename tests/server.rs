mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use common::{FakeEmbedder, FakeStore, catalog, instant_config};
use project_finder::server::{AppState, router};
use project_finder::services::IngestionPipeline;

async fn app_with(embedder: FakeEmbedder) -> axum::Router {
    let store = FakeStore::new();
    IngestionPipeline::new(&FakeEmbedder::new(), &store, &instant_config())
        .run(&catalog())
        .await
        .unwrap();
    router(AppState::new(Arc::new(embedder), Arc::new(store), 20))
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/projects/search")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_get_without_query_is_bad_request() {
    let app = app_with(FakeEmbedder::new()).await;
    let (status, body) = send(app, get("/api/projects/search?category=AI")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({"error": "Query parameter is required"}));
}

#[tokio::test]
async fn test_get_returns_flat_results() {
    let app = app_with(FakeEmbedder::new()).await;
    let (status, body) = send(app, get("/api/projects/search?query=robot%20control&top=2")).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0]["projectNo"].is_string());
    assert!(results[0]["score"].is_number());
    assert_eq!(results[0]["category"], "AI");
}

#[tokio::test]
async fn test_get_joint_filter() {
    let app = app_with(FakeEmbedder::new()).await;
    let (status, body) = send(app, get("/api/projects/search?query=robot&joint=true")).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r["isJointOrURECA"] != "No"));
}

#[tokio::test]
async fn test_get_rejects_bad_top() {
    let app = app_with(FakeEmbedder::new()).await;
    let (status, body) = send(app, get("/api/projects/search?query=robot&top=lots")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("top"));
}

#[tokio::test]
async fn test_post_with_filters() {
    let app = app_with(FakeEmbedder::new()).await;
    let (status, body) = send(
        app,
        post(serde_json::json!({
            "query": "robot",
            "filters": {"category": "AI", "type": "URECA"},
            "topK": 5
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["projectNo"], "P4");
}

#[tokio::test]
async fn test_post_without_query_is_bad_request() {
    let app = app_with(FakeEmbedder::new()).await;
    let (status, body) = send(app, post(serde_json::json!({"filters": {}}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Query parameter is required");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = app_with(FakeEmbedder::new()).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/projects/search")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_pipeline_error_is_internal_error() {
    let app = app_with(FakeEmbedder::failing()).await;
    let (status, body) = send(app, get("/api/projects/search?query=robot")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_health() {
    let app = app_with(FakeEmbedder::new()).await;
    let (status, body) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
