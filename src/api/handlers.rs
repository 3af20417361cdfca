//! API Handlers
//!
//! HTTP request handlers for each tool endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::config::Config;
use crate::error::Result;
use crate::gateway::QueryGateway;
use crate::models::{
    FetchRequest, FetchResults, HealthResponse, SearchItem, SearchRequest, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The gateway owns the shared cache, so cloning the state is cheap.
#[derive(Clone)]
pub struct AppState {
    pub gateway: QueryGateway,
}

impl AppState {
    /// Creates a new AppState around the given gateway.
    pub fn new(gateway: QueryGateway) -> Self {
        Self { gateway }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(QueryGateway::from_config(config)?))
    }
}

/// Handler for POST /tools/search
///
/// Returns a single summary item whose id can be passed to fetch.
pub async fn search_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Vec<SearchItem>>> {
    let Json(req) = body?;
    let items = state.gateway.search(req).await?;
    Ok(Json(items))
}

/// Handler for POST /tools/fetch
///
/// Maps every requested id to its live payload or an error marker, in
/// request order.
pub async fn fetch_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<FetchRequest>, JsonRejection>,
) -> Result<Json<FetchResults>> {
    let Json(req) = body?;
    let out = state.gateway.fetch(&req.object_ids).await?;
    Ok(Json(out))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.gateway.stats().await))
}

/// Handler for GET /healthz
///
/// Liveness only; never checks upstream.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
