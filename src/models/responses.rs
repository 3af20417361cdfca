//! Response DTOs for the tool API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cache::CacheStats;

/// Error message returned for ids that are not in the cache.
pub const UNKNOWN_ID_MESSAGE: &str = "Expired or unknown id. Please re-run search.";

/// Summary item returned by search (POST /tools/search)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItem {
    /// Fingerprint of the query; pass it to fetch for the full payload
    pub id: String,
    /// Event, date range and breakdown dimension
    pub title: String,
    /// Comma-joined top group names, or "no data"
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<SearchPreview>,
}

/// Preview attached to a search item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPreview {
    pub top: Vec<String>,
    pub series: Value,
}

/// Per-id result of fetch (POST /tools/fetch)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FetchOutcome {
    /// Live payload plus the parameters that produced it
    Found {
        meta: Map<String, Value>,
        payload: Value,
    },
    /// The id was never issued or is no longer known
    Missing { error: String },
}

impl FetchOutcome {
    pub fn unknown_id() -> Self {
        FetchOutcome::Missing {
            error: UNKNOWN_ID_MESSAGE.to_string(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, FetchOutcome::Found { .. })
    }
}

/// Fetch results keyed by id, serialized as a JSON object whose keys keep
/// the order the ids were requested in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResults {
    entries: Vec<(String, FetchOutcome)>,
}

impl FetchResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an outcome for `id`; a repeated id replaces the earlier one in place.
    pub fn insert(&mut self, id: String, outcome: FetchOutcome) {
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some((_, slot)) => *slot = outcome,
            None => self.entries.push((id, outcome)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&FetchOutcome> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Ids in request order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FetchResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, outcome) in &self.entries {
            map.serialize_entry(id, outcome)?;
        }
        map.end()
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Lookups answered from a fresh entry
    pub hits: u64,
    /// Lookups for unknown fingerprints
    pub misses: u64,
    /// Lookups that found a stale entry
    pub stale: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// hits / (hits + misses + stale)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            stale: stats.stale,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the liveness check (GET /healthz)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
    /// Stable error kind, e.g. "rate_limited"
    pub kind: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind: kind.into(),
        }
    }
}
