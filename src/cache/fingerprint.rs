//! Request Fingerprint Module
//!
//! Canonical description of one upstream query and the deterministic id
//! derived from it.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Namespace tag that prefixes every fingerprint.
pub const FINGERPRINT_PREFIX: &str = "seg#";

// == Request Spec ==
/// Endpoint path plus query parameters of one upstream call.
///
/// Parameters live in a `BTreeMap`, so serialization order never depends on
/// the order callers inserted them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSpec {
    endpoint: String,
    params: BTreeMap<String, String>,
}

impl RequestSpec {
    /// Creates a spec with no parameters.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
        }
    }

    /// Adds or replaces a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    // == Canonical Form ==
    /// Deterministic JSON serialization used for hashing and equality.
    pub fn canonical(&self) -> String {
        // A struct of strings and a string map cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

// == Fingerprint ==
/// Opaque id of a [`RequestSpec`]: prefix plus hex SHA-256 of its canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derives the fingerprint of a spec. Pure and order independent.
    pub fn of(spec: &RequestSpec) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(spec.canonical().as_bytes());
        Self(format!("{}{:x}", FINGERPRINT_PREFIX, hasher.finalize()))
    }

    /// Wraps an id received from a caller. No validation: unknown ids just miss.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
