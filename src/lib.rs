//! Segmentation Proxy - search/fetch tools over an analytics query API
//!
//! Caches upstream segmentation results under a deterministic fingerprint of
//! each request and hands the fingerprint out as an id for later fetches.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod upstream;

pub use api::AppState;
pub use config::Config;
pub use error::GatewayError;
pub use gateway::QueryGateway;
