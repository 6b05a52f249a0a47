//! Deterministic request fingerprints.
//!
//! A fingerprint identifies a `(namespace, payload)` pair. The payload is
//! canonicalized first (object keys sorted at every depth) so two payloads that
//! differ only in field insertion order hash to the same value.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA-256 fingerprint of a namespaced request payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for an already-serialized payload.
    pub fn from_value(namespace: &str, payload: &Value) -> Self {
        let canonical = canonicalize(payload);
        let json = canonical.to_string();

        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        hasher.update(b"\n");
        hasher.update(json.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
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

/// Fingerprint any serializable payload under `namespace`.
pub fn fingerprint<P>(namespace: &str, payload: &P) -> serde_json::Result<Fingerprint>
where
    P: Serialize + ?Sized,
{
    let value = serde_json::to_value(payload)?;
    Ok(Fingerprint::from_value(namespace, &value))
}

/// Rebuild a JSON value with object keys in sorted order at every depth.
///
/// Array order is significant and left untouched.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
