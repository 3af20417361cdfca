//! Cache Module
//!
//! Request fingerprints and the in-memory cache of upstream results keyed by
//! them, with a fixed freshness window.

mod clock;
mod entry;
mod fingerprint;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{freshness_ttl, CacheEntry, FRESHNESS_TTL_SECS};
pub use fingerprint::{Fingerprint, RequestSpec, FINGERPRINT_PREFIX};
pub use stats::CacheStats;
pub use store::{FingerprintCache, Lookup};
