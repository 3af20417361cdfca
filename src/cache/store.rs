//! Cache Store Module
//!
//! Fingerprint-keyed map of upstream results with a fixed freshness window.
//! Entries are never evicted; staleness is decided on read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::cache::{CacheEntry, CacheStats, Fingerprint, RequestSpec};

// == Lookup Result ==
/// Outcome of [`FingerprintCache::lookup`].
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Entry present and inside the freshness window
    Fresh(CacheEntry),
    /// Entry present but too old to reuse
    Stale(CacheEntry),
    /// Nothing stored under the fingerprint
    Miss,
}

impl Lookup {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Lookup::Fresh(_))
    }
}

// == Fingerprint Cache ==
/// Process-lifetime cache of upstream results.
///
/// Memory grows with every distinct fingerprint observed.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: HashMap<Fingerprint, CacheEntry>,
    stats: CacheStats,
}

impl FingerprintCache {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Lookup ==
    /// Looks up `id` and classifies the entry against `now`.
    pub fn lookup(&mut self, id: &Fingerprint, now: DateTime<Utc>) -> Lookup {
        match self.entries.get(id) {
            Some(entry) if entry.is_fresh(now) => {
                self.stats.record_hit();
                Lookup::Fresh(entry.clone())
            }
            Some(entry) => {
                self.stats.record_stale();
                Lookup::Stale(entry.clone())
            }
            None => {
                self.stats.record_miss();
                Lookup::Miss
            }
        }
    }

    // == Store ==
    /// Inserts or overwrites the entry for `id`, stamping it with `now`.
    pub fn store(
        &mut self,
        id: Fingerprint,
        spec: RequestSpec,
        payload: Value,
        now: DateTime<Utc>,
    ) {
        let entry = CacheEntry::new(id.clone(), spec, payload, now);
        self.entries.insert(id, entry);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the entry regardless of freshness. Does not touch statistics.
    pub fn get(&self, id: &Fingerprint) -> Option<CacheEntry> {
        self.entries.get(id).cloned()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
