//! Error types for core validation
//!
//! These errors are raised before anything reaches the document service:
//! malformed table names, keys the service would reject, unparsable queries
//! and invalid configuration.

use thiserror::Error;

/// Core validation errors
#[derive(Debug, Error)]
pub enum Error {
    /// Table name is empty, too long or contains reserved characters
    #[error("invalid table name '{name}': {reason}")]
    InvalidTableName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Key or id is not acceptable as a document id
    #[error("invalid key '{key}': {reason}")]
    InvalidKey {
        /// The rejected key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// Query text failed to parse
    #[error("invalid query at offset {offset}: {message}")]
    InvalidQuery {
        /// Byte offset into the query text
        offset: usize,
        /// Parser message
        message: String,
    },

    /// Configuration is missing a value or has one out of range
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_key(key: &str, reason: impl Into<String>) -> Self {
        Error::InvalidKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_table(name: &str, reason: impl Into<String>) -> Self {
        Error::InvalidTableName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_query(offset: usize, message: impl Into<String>) -> Self {
        Error::InvalidQuery {
            offset,
            message: message.into(),
        }
    }
}
