//! API Module
//!
//! HTTP handlers and routing for the tool API.
//!
//! # Endpoints
//! - `POST /tools/search` - Summarize a segmentation query
//! - `POST /tools/fetch` - Full payloads for ids returned by search
//! - `GET /stats` - Cache statistics
//! - `GET /healthz` - Liveness check

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
