// Request fingerprinting for the response cache
// Author: kelexine (https://github.com/kelexine)

use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 fingerprint of a canonicalized request descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Fingerprint any serializable descriptor.
    ///
    /// Object keys are sorted recursively before hashing, so two descriptors
    /// with the same field values hash identically regardless of field order.
    /// Array order is preserved: message lists are order-sensitive.
    pub fn for_descriptor<T: Serialize + ?Sized>(descriptor: &T) -> Result<Self> {
        let value = serde_json::to_value(descriptor)?;
        Ok(Self::for_value(&value))
    }

    pub fn for_value(value: &Value) -> Self {
        let canonical = canonicalize(value);
        // Serializing a Value cannot fail: keys are always strings.
        let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
        let digest = Sha256::digest(&bytes);
        CacheKey(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        CacheKey(s.to_string())
    }
}

/// Rebuild `value` with every object's entries inserted in sorted key order.
///
/// Inserting in sorted order keeps the result canonical whether or not
/// serde_json's `preserve_order` feature is enabled somewhere in the build.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::with_capacity(entries.len());
            for (k, v) in entries {
                sorted.insert(k.clone(), canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
