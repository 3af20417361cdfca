//! Upstream Module
//!
//! Access to the third-party analytics query API.

mod client;

pub use client::{HttpSegmentationClient, SegmentationApi, UPSTREAM_TIMEOUT};
