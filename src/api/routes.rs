//! API Routes
//!
//! Configures the Axum router with all tool endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{fetch_handler, health_handler, search_handler, stats_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /tools/search` - Summarize a segmentation query
/// - `POST /tools/fetch` - Full payloads for ids returned by search
/// - `GET /stats` - Cache statistics
/// - `GET /healthz` - Liveness check
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools/search", post(search_handler))
        .route("/tools/fetch", post(fetch_handler))
        .route("/stats", get(stats_handler))
        .route("/healthz", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
