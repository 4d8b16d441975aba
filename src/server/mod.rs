//! HTTP search API.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use crate::error::SearchError;
use crate::models::{SearchConstraints, SearchQuery, SearchResult};
use crate::services::{EmbeddingClient, QueryPipeline, VectorStore};

const MISSING_QUERY: &str = "Query parameter is required";

/// Adapters shared by every request. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    default_top_k: u32,
}

impl AppState {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        default_top_k: u32,
    ) -> Self {
        Self {
            embedder,
            store,
            default_top_k,
        }
    }
}

#[derive(Debug)]
enum HttpError {
    BadRequest(String),
    Search(SearchError),
}

impl From<SearchError> for HttpError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidQuery(msg) => HttpError::BadRequest(msg),
            other => HttpError::Search(other),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::BadRequest(msg) => {
                tracing::debug!("rejected request: {msg}");
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
            }
            HttpError::Search(err) => {
                tracing::error!("search failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": err.to_string() })),
                )
            }
        }
        .into_response()
    }
}

/// Query-string form of a search (`GET`).
#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    query: Option<String>,
    category: Option<String>,
    #[serde(rename = "type")]
    project_type: Option<String>,
    supervisor: Option<String>,
    joint: Option<String>,
    top: Option<String>,
}

/// JSON body form of a search (`POST`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    filters: SearchConstraints,
    #[serde(default)]
    top_k: Option<u32>,
}

fn required_query(query: Option<String>) -> Result<String, HttpError> {
    query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| HttpError::BadRequest(MISSING_QUERY.to_string()))
}

fn parse_top(top: Option<&str>, default: u32) -> Result<u32, HttpError> {
    match top.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| HttpError::BadRequest(format!("top must be a positive integer, got {raw:?}"))),
    }
}

async fn run_search(state: &AppState, query: SearchQuery) -> Result<Response, HttpError> {
    let pipeline = QueryPipeline::new(state.embedder.as_ref(), state.store.as_ref());
    let results: Vec<SearchResult> = pipeline.search(&query).await?.results;
    Ok(Json(json!({ "results": results })).into_response())
}

async fn search_get(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, HttpError> {
    let text = required_query(params.query)?;
    let top_k = parse_top(params.top.as_deref(), state.default_top_k)?;
    let constraints = SearchConstraints {
        category: params.category,
        project_type: params.project_type,
        supervisor: params.supervisor,
        joint: params.joint.as_deref() == Some("true"),
    };

    let query = SearchQuery::new(text)
        .with_top_k(top_k)
        .with_constraints(constraints);
    run_search(&state, query).await
}

async fn search_post(
    State(state): State<AppState>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Response, HttpError> {
    let Json(body) = body.map_err(|e| HttpError::BadRequest(e.body_text()))?;
    let text = required_query(body.query)?;
    let top_k = match body.top_k {
        Some(0) => return Err(HttpError::BadRequest("topK must be at least 1".to_string())),
        Some(n) => n,
        None => state.default_top_k,
    };

    let query = SearchQuery::new(text)
        .with_top_k(top_k)
        .with_constraints(body.filters);
    run_search(&state, query).await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/projects/search", get(search_get).post(search_post))
        .route("/health", get(health))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(state)
}

/// Serve the API until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_query() {
        assert_eq!(required_query(Some(" robots ".into())).unwrap(), "robots");
        assert!(matches!(
            required_query(Some("   ".into())),
            Err(HttpError::BadRequest(msg)) if msg == MISSING_QUERY
        ));
        assert!(required_query(None).is_err());
    }

    #[test]
    fn test_parse_top() {
        assert_eq!(parse_top(None, 20).unwrap(), 20);
        assert_eq!(parse_top(Some(""), 20).unwrap(), 20);
        assert_eq!(parse_top(Some("5"), 20).unwrap(), 5);
        assert!(parse_top(Some("0"), 20).is_err());
        assert!(parse_top(Some("abc"), 20).is_err());
    }

    #[test]
    fn test_invalid_query_maps_to_bad_request() {
        let err = HttpError::from(SearchError::InvalidQuery("empty".into()));
        assert!(matches!(err, HttpError::BadRequest(_)));
    }
}
