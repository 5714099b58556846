//! Table names
//!
//! A table is declared with either a plain name (`orders`) or a compound name
//! (`orders/Region`) naming the entity field used as the partition key. Every
//! other operation accepts either form and only looks at the plain part.

use crate::error::{Error, Result};
use std::fmt;

/// Partition key path of tables declared without a partition field
pub const DEFAULT_PARTITION_KEY_PATH: &str = "/id";

/// Maximum length of a table name
pub const MAX_TABLE_NAME_LEN: usize = 255;

/// A validated table name with its optional partition field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    name: String,
    partition_field: Option<String>,
}

impl TableName {
    /// Parse a plain or compound table name.
    ///
    /// ```
    /// use tablestore_core::TableName;
    ///
    /// let table = TableName::parse("orders/Region").unwrap();
    /// assert_eq!(table.name(), "orders");
    /// assert_eq!(table.partition_field(), Some("Region"));
    /// assert_eq!(table.partition_key_path(), "/Region");
    ///
    /// let plain = TableName::parse("orders").unwrap();
    /// assert_eq!(plain.partition_key_path(), "/id");
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let (name, field) = match raw.split_once('/') {
            Some((name, field)) => (name, Some(field)),
            None => (raw, None),
        };

        validate_name(raw, name)?;

        let partition_field = match field {
            Some(field) => {
                if !is_identifier(field) {
                    return Err(Error::invalid_table(
                        raw,
                        format!("partition field '{}' is not a plain field name", field),
                    ));
                }
                // `/id` is the default path; treat it as no declared field
                if field == "id" {
                    None
                } else {
                    Some(field.to_string())
                }
            }
            None => None,
        };

        Ok(TableName {
            name: name.to_string(),
            partition_field,
        })
    }

    /// Rebuild a table name from a stored partition key path.
    pub fn from_partition_key_path(name: &str, path: &str) -> Result<Self> {
        let field = path.strip_prefix('/').unwrap_or(path);
        if field == "id" {
            Self::parse(name)
        } else {
            Self::parse(&format!("{}/{}", name, field))
        }
    }

    /// Plain table name, without the partition field
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared partition field, if any
    pub fn partition_field(&self) -> Option<&str> {
        self.partition_field.as_deref()
    }

    /// Whether the table was declared with a partition field
    pub fn is_partitioned(&self) -> bool {
        self.partition_field.is_some()
    }

    /// Partition key path as stored by the document service
    pub fn partition_key_path(&self) -> String {
        match &self.partition_field {
            Some(field) => format!("/{}", field),
            None => DEFAULT_PARTITION_KEY_PATH.to_string(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.partition_field {
            Some(field) => write!(f, "{}/{}", self.name, field),
            None => f.write_str(&self.name),
        }
    }
}

fn validate_name(raw: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_table(raw, "name must not be empty"));
    }
    if name.chars().count() > MAX_TABLE_NAME_LEN {
        return Err(Error::invalid_table(
            raw,
            format!("name exceeds {} characters", MAX_TABLE_NAME_LEN),
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, '\\' | '?' | '#') || c.is_whitespace() || c.is_control())
    {
        return Err(Error::invalid_table(
            raw,
            format!("name contains reserved character {:?}", c),
        ));
    }
    Ok(())
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
