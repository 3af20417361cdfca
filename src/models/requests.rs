//! Request DTOs for the tool API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

fn default_top_k() -> i64 {
    5
}

/// Request body for the search tool (POST /tools/search)
///
/// Every field is optional. Empty strings are treated like missing values.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    /// Free-text query; a single word doubles as the event name
    #[serde(default)]
    pub query: String,
    /// Explicit event name
    #[serde(default)]
    pub event: Option<String>,
    /// First day of the range, `YYYY-MM-DD` (default: 7 days ago)
    #[serde(default)]
    pub from_date: Option<String>,
    /// Last day of the range, `YYYY-MM-DD` (default: today)
    #[serde(default)]
    pub to_date: Option<String>,
    /// Aggregation unit (default: "day")
    #[serde(default)]
    pub unit: Option<String>,
    /// Breakdown property expression, e.g. `properties["platform"]`
    #[serde(default)]
    pub breakdown: Option<String>,
    /// Filter expression
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    /// How many group names to show in the summary (clamped to 1..=5)
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

impl SearchRequest {
    /// Search for an explicit event with all other fields defaulted.
    pub fn for_event(event: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            ..Self::default()
        }
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            event: None,
            from_date: None,
            to_date: None,
            unit: None,
            breakdown: None,
            where_clause: None,
            top_k: default_top_k(),
        }
    }
}

/// Request body for the fetch tool (POST /tools/fetch)
#[derive(Debug, Clone, Deserialize)]
pub struct FetchRequest {
    /// Ids previously returned by search
    #[serde(rename = "objectIds")]
    pub object_ids: Vec<String>,
}
