//! Mapping entity keys to document addresses.
//!
//! | Table | Key | Document id | Partition |
//! |-------|-----|-------------|-----------|
//! | `t` | `k` | `k` | `k` |
//! | `t/Name` | `v1/k` | `k` | `v1` |
//! | `t/Name` | `k` | `k` | entity's `Name` field (unknown on lookup) |
//!
//! On partitioned tables the prefixed form rewrites the stored key field to
//! the suffix, so the entity read back has `key == id`.

use crate::error::{Error, Result};
use serde_json::Value;
use tablestore_core::document::ID_FIELD;
use tablestore_core::key::validate_id;
use tablestore_core::{Document, EntityKey, PartitionValue, TableItem, TableName};

/// Where a key lives
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Location {
    /// Partition and id both known: point operation
    Point {
        /// Partition value
        partition: PartitionValue,
        /// Document id
        id: String,
    },
    /// Only the id is known: cross-partition lookup by id
    Scan {
        /// Document id
        id: String,
    },
}

impl Location {
    pub(crate) fn id(&self) -> &str {
        match self {
            Location::Point { id, .. } | Location::Scan { id } => id,
        }
    }
}

/// Resolve a caller key against a table's partitioning.
pub(crate) fn locate(table: &TableName, key: &str) -> Result<Location> {
    if !table.is_partitioned() {
        validate_id(key)?;
        return Ok(Location::Point {
            partition: PartitionValue::from(key),
            id: key.to_string(),
        });
    }

    let parsed = EntityKey::parse(key);
    match parsed.partition() {
        Some("") => Err(Error::InvalidKey(format!(
            "'{}': partition prefix is empty",
            key
        ))),
        Some(prefix) => {
            validate_id(parsed.id())?;
            Ok(Location::Point {
                partition: PartitionValue::from(prefix),
                id: parsed.id().to_string(),
            })
        }
        None => {
            validate_id(key)?;
            Ok(Location::Scan {
                id: key.to_string(),
            })
        }
    }
}

/// Serialize an entity into the document to store and the partition to store it under.
pub(crate) fn to_document<T: TableItem>(
    table: &TableName,
    entity: &T,
) -> Result<(PartitionValue, Document)> {
    let key = entity.key();
    let mut document = match serde_json::to_value(entity)? {
        Value::Object(map) => map,
        other => {
            return Err(Error::Serialization(format!(
                "entity '{}' serialized to {} instead of an object",
                key,
                kind(&other)
            )))
        }
    };

    let location = locate(table, key)?;
    let id = location.id().to_string();
    document.insert(ID_FIELD.to_string(), Value::String(id.clone()));

    let partition = match (table.partition_field(), location) {
        (None, Location::Point { partition, .. }) => partition,
        (Some(field), Location::Point { partition, .. }) => {
            document.insert(T::KEY_FIELD.to_string(), Value::String(id));
            match document.get(field).cloned() {
                None | Some(Value::Null) => {
                    document.insert(field.to_string(), partition.value().clone());
                }
                Some(existing) if &existing == partition.value() => {}
                Some(existing) => {
                    return Err(Error::InvalidKey(format!(
                        "'{}': prefix '{}' does not match {} = {}",
                        key, partition, field, existing
                    )))
                }
            }
            partition
        }
        (Some(field), Location::Scan { .. }) => {
            PartitionValue::from_document(&document, &format!("/{}", field))
        }
        (None, Location::Scan { .. }) => {
            return Err(Error::Internal(format!(
                "key '{}' resolved to a scan on an unpartitioned table",
                key
            )))
        }
    };

    if !partition.is_scalar() {
        return Err(Error::InvalidKey(format!(
            "'{}': partition value {} is not a scalar",
            key, partition
        )));
    }
    Ok((partition, document))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
