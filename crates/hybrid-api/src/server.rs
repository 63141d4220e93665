//! HTTP server and request handlers.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use hybrid_core::{
    DatasetConfig, ProjectedHit, Result, RetrievalGateway, SearchError, SearchParams, Strategy,
};
use hybrid_query::SearchOrchestrator;

use crate::error::ApiError;

/// Query string of `GET /api/search/{index}`.
///
/// Values arrive as raw strings so malformed input can be reported as a
/// JSON error rather than a bare extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Free-text query.
    pub q: Option<String>,

    /// `bm25` (default) or `elser`.
    #[serde(rename = "type")]
    pub search_type: Option<String>,

    /// `true` (any case) to fuse semantic and lexical hits.
    pub rrf: Option<String>,

    /// RRF rank constant.
    pub k: Option<String>,

    /// Dataset identifier.
    pub dataset: Option<String>,
}

impl SearchQuery {
    /// Turn the raw query string into search parameters.
    pub fn into_params(self, index: String, default_k: u32) -> Result<SearchParams> {
        let strategy = match self.search_type.as_deref() {
            Some(raw) => raw.parse::<Strategy>()?,
            None => Strategy::Bm25,
        };

        let rrf = self
            .rrf
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let k = match self.k.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse::<u32>().map_err(|_| {
                SearchError::invalid_query(format!("k must be a non-negative integer, got '{}'", raw))
            })?,
            _ => default_k,
        };

        Ok(SearchParams {
            query: self.q.unwrap_or_default(),
            dataset: self.dataset.filter(|d| !d.trim().is_empty()),
            strategy,
            rrf,
            k,
            index: Some(index),
        })
    }
}

/// Body of a successful search.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub response: Vec<ProjectedHit>,
}

/// Build the API router over a shared orchestrator.
pub fn router<G>(engine: Arc<SearchOrchestrator<G>>) -> Router
where
    G: RetrievalGateway + 'static,
{
    Router::new()
        .route("/api/search/{index}", get(handle_search::<G>))
        .route("/api/datasets", get(handle_datasets::<G>))
        .fallback(handle_not_found)
        .with_state(engine)
}

async fn handle_search<G>(
    State(engine): State<Arc<SearchOrchestrator<G>>>,
    Path(index): Path<String>,
    Query(query): Query<SearchQuery>,
) -> std::result::Result<Json<SearchResponse>, ApiError>
where
    G: RetrievalGateway + 'static,
{
    let params = query.into_params(index, engine.config().default_rrf_k)?;
    let results = engine.search(params).await?;

    debug!(
        "Answering {} results for {:?} in {}ms",
        results.total_results, results.query, results.latency_ms
    );

    Ok(Json(SearchResponse {
        response: results.results,
    }))
}

async fn handle_datasets<G>(
    State(engine): State<Arc<SearchOrchestrator<G>>>,
) -> Json<BTreeMap<String, DatasetConfig>>
where
    G: RetrievalGateway + 'static,
{
    Json(engine.datasets().clone())
}

async fn handle_not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": format!("404 Not Found: no route for {}", uri.path()),
        })),
    )
}

/// Running HTTP API server.
pub struct ApiServer {
    /// The address the server is listening on.
    addr: SocketAddr,

    /// Handle to the background server task.
    handle: JoinHandle<()>,
}

impl ApiServer {
    /// Bind to `bind_address` (port `0` picks a free port) and serve in a
    /// background task.
    pub async fn start<G>(engine: Arc<SearchOrchestrator<G>>, bind_address: &str) -> Result<Self>
    where
        G: RetrievalGateway + 'static,
    {
        let listener = TcpListener::bind(bind_address).await?;
        let addr = listener.local_addr()?;
        let app = router(engine);

        info!("Search API listening on http://{}", addr);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Search API server error: {}", e);
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait until the server task exits.
    pub async fn wait(self) -> Result<()> {
        self.handle
            .await
            .map_err(|e| SearchError::internal(format!("server task failed: {}", e)))
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}
