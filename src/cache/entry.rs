//! Cache Entry Module
//!
//! Defines the structure for individual fingerprint cache entries and their
//! freshness window.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::cache::{Fingerprint, RequestSpec};

/// Freshness window of a cached upstream result, in seconds (15 minutes).
pub const FRESHNESS_TTL_SECS: i64 = 15 * 60;

/// Freshness window as a chrono duration.
pub fn freshness_ttl() -> Duration {
    Duration::seconds(FRESHNESS_TTL_SECS)
}

// == Cache Entry ==
/// One cached upstream result together with the query that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Id under which the entry is stored
    pub fingerprint: Fingerprint,
    /// Query that produced the payload; fetch replays it
    pub spec: RequestSpec,
    /// Raw upstream JSON
    pub payload: Value,
    /// When the payload was obtained
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(
        fingerprint: Fingerprint,
        spec: RequestSpec,
        payload: Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            fingerprint,
            spec,
            payload,
            created_at,
        }
    }

    // == Is Fresh ==
    /// Checks whether the entry may still be reused at `now`.
    ///
    /// Boundary condition: an entry exactly one TTL old is stale.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at < freshness_ttl()
    }

    // == Age ==
    /// Time elapsed since the payload was obtained, clamped at zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).max(Duration::zero())
    }
}
