//! Stored documents and partition values

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A stored JSON document (always an object at the root)
pub type Document = Map<String, Value>;

/// Document field holding the id
pub const ID_FIELD: &str = "id";

/// Fields the document service stamps on every write
pub const SYSTEM_FIELDS: [&str; 2] = ["_ts", "_etag"];

/// Value of a document's partition key.
///
/// Any JSON scalar is a valid partition value; documents missing their
/// partition field live in the `null` partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionValue(Value);

impl PartitionValue {
    /// Wrap a JSON value
    pub fn new(value: impl Into<Value>) -> Self {
        PartitionValue(value.into())
    }

    /// The `null` partition
    pub fn null() -> Self {
        PartitionValue(Value::Null)
    }

    /// Read the partition value of `doc` for a partition key path like `/Name`.
    pub fn from_document(doc: &Document, path: &str) -> Self {
        let field = path.strip_prefix('/').unwrap_or(path);
        doc.get(field)
            .cloned()
            .map(PartitionValue)
            .unwrap_or_else(Self::null)
    }

    /// Underlying JSON value
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Whether the value is a JSON scalar (partition values must be)
    pub fn is_scalar(&self) -> bool {
        !matches!(self.0, Value::Array(_) | Value::Object(_))
    }

    /// Canonical text used to order and compare partitions
    pub fn canonical(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for PartitionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

impl From<&str> for PartitionValue {
    fn from(s: &str) -> Self {
        PartitionValue(Value::String(s.to_string()))
    }
}

impl From<String> for PartitionValue {
    fn from(s: String) -> Self {
        PartitionValue(Value::String(s))
    }
}

/// Remove the fields the service stamps on writes.
pub fn strip_system_fields(doc: &mut Document) {
    for field in SYSTEM_FIELDS {
        doc.remove(field);
    }
}
