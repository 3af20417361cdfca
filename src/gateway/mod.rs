//! Gateway Module
//!
//! The search and fetch operations of the tool API.

mod service;
pub mod summary;

pub use service::{
    QueryGateway, ALLOWED_SAMPLE_SIZE, DEFAULT_BREAKDOWN, DEFAULT_LOOKBACK_DAYS, DEFAULT_UNIT,
    SEGMENTATION_ENDPOINT,
};
