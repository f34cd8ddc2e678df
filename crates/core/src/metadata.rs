//! Work metadata: the schema-free description of a unit of work.

use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Keys that change between otherwise identical runs and never take part
/// in the cache key.
pub const VOLATILE_KEYS: &[&str] = &[
    "timestamp",
    "started_at",
    "run_id",
    "execution_id",
    "priority_override",
];

/// Caller-supplied attributes of a test: identifier, module, tags, hints.
///
/// Keys are kept sorted so serialization is canonical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkMetadata {
    attrs: BTreeMap<String, Value>,
}

impl WorkMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// The test identifier (`id`, or `name` when `id` is absent).
    pub fn id(&self) -> Option<&str> {
        self.str_attr("id").or_else(|| self.str_attr("name"))
    }

    /// The category (`module`, or `category` when `module` is absent).
    pub fn module(&self) -> Option<&str> {
        self.str_attr("module").or_else(|| self.str_attr("category"))
    }

    /// Caller-requested priority, if present and numeric.
    pub fn priority_override(&self) -> Option<i64> {
        match self.attrs.get("priority_override")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn str_attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// The metadata with [`VOLATILE_KEYS`] removed.
    pub fn stable(&self) -> WorkMetadata {
        let attrs = self
            .attrs
            .iter()
            .filter(|(k, _)| !VOLATILE_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        WorkMetadata { attrs }
    }

    /// Canonical JSON of the stable attributes.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(&self.stable().attrs).unwrap_or_default()
    }

    /// A SHA-256 hex key identifying logically identical work.
    pub fn cache_key(&self) -> String {
        hash_hex(&self.canonical_json())
    }
}

impl From<serde_json::Map<String, Value>> for WorkMetadata {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self {
            attrs: map.into_iter().collect(),
        }
    }
}

impl TryFrom<Value> for WorkMetadata {
    type Error = MetadataError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(map.into()),
            other => Err(MetadataError::NotAnObject(other.to_string())),
        }
    }
}

/// Lowercase hex SHA-256 of `input`.
pub fn hash_hex(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}
