//! Request and Response models for the tool API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{FetchRequest, SearchRequest};
pub use responses::{
    ErrorResponse, FetchOutcome, FetchResults, HealthResponse, SearchItem, SearchPreview, StatsResponse,
    UNKNOWN_ID_MESSAGE,
};
