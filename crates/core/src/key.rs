//! Entity key convention
//!
//! Keys on partitioned tables may carry their partition value as a prefix:
//! `partitionValue/uniqueSuffix`. The stored id is the suffix only. The split
//! happens at the first `/`, so the suffix itself can never contain one.

use crate::error::{Error, Result};

/// Maximum length of a document id, in characters
pub const MAX_ID_LEN: usize = 255;

/// Characters the document service refuses inside ids
pub const RESERVED_ID_CHARS: [char; 4] = ['/', '\\', '?', '#'];

/// A key split into its optional partition prefix and id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityKey<'a> {
    partition: Option<&'a str>,
    id: &'a str,
}

impl<'a> EntityKey<'a> {
    /// Split a key at its first `/`.
    ///
    /// ```
    /// use tablestore_core::EntityKey;
    ///
    /// let key = EntityKey::parse("name1/6f1c");
    /// assert_eq!(key.partition(), Some("name1"));
    /// assert_eq!(key.id(), "6f1c");
    ///
    /// let plain = EntityKey::parse("6f1c");
    /// assert_eq!(plain.partition(), None);
    /// assert_eq!(plain.id(), "6f1c");
    /// ```
    pub fn parse(key: &'a str) -> Self {
        match key.split_once('/') {
            Some((partition, id)) => EntityKey {
                partition: Some(partition),
                id,
            },
            None => EntityKey {
                partition: None,
                id: key,
            },
        }
    }

    /// Partition prefix, if the key carried one
    pub fn partition(&self) -> Option<&'a str> {
        self.partition
    }

    /// Document id
    pub fn id(&self) -> &'a str {
        self.id
    }
}

/// Check that `id` is acceptable as a document id.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::invalid_key(id, "id must not be empty"));
    }
    if id.chars().count() > MAX_ID_LEN {
        return Err(Error::invalid_key(
            id,
            format!("id exceeds {} characters", MAX_ID_LEN),
        ));
    }
    if let Some(c) = id.chars().find(|c| RESERVED_ID_CHARS.contains(c)) {
        return Err(Error::invalid_key(
            id,
            format!("id contains reserved character '{}'", c),
        ));
    }
    Ok(())
}
