//! Unified error type for tablestore.
//!
//! Wraps validation errors from `tablestore-core` and failures reported by the
//! document service, and presents one consistent interface to callers.

use std::fmt;
use tablestore_core::Error as CoreError;
use tablestore_storage::ServiceError;
use thiserror::Error;

/// All tablestore errors.
///
/// Missing entities are never errors: lookups return `None` or `false`.
/// `NotFound` is reserved for missing tables and databases.
#[derive(Debug, Error)]
pub enum Error {
    /// Table or database not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Table name rejected
    #[error("invalid table name: {0}")]
    InvalidTableName(String),

    /// Key rejected (reserved characters, too long, prefix mismatch)
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Filter or query text could not be parsed
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// `first()` on a stream with no elements
    #[error("sequence contains no elements")]
    NoElement,

    /// Table exists with a different configuration
    #[error("conflict: {0}")]
    Conflict(String),

    /// One or more items of a batch write failed
    #[error("{} of {} batch items failed", .failed.len(), .committed + .failed.len())]
    Batch {
        /// Items written successfully
        committed: usize,
        /// Items that did not commit
        failed: Vec<BatchFailure>,
    },

    /// The operation was cancelled through its token
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// The principal was rejected by the service
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The service could not be reached
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity could not be converted to or from a document
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other service failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for tablestore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A batch item that did not commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Key of the failed entity
    pub key: String,
    /// Why it failed
    pub reason: String,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

impl Error {
    /// Check if this error is retryable.
    ///
    /// Only connectivity failures are; everything else fails the same way on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Connectivity(_))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if the service could not be used at all (unreachable or unauthorized).
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Connectivity(_) | Error::Auth(_))
    }

    /// Check if this error came from cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Keys that failed in a batch error, empty for any other error.
    pub fn failed_keys(&self) -> Vec<&str> {
        match self {
            Error::Batch { failed, .. } => failed.iter().map(|f| f.key.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

// Convert from core validation errors
impl From<CoreError> for Error {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidTableName { name, reason } => {
                Error::InvalidTableName(format!("'{}': {}", name, reason))
            }
            CoreError::InvalidKey { key, reason } => {
                Error::InvalidKey(format!("'{}': {}", key, reason))
            }
            CoreError::InvalidQuery { offset, message } => {
                Error::InvalidQuery(format!("at offset {}: {}", offset, message))
            }
            CoreError::Config(msg) => Error::Config(msg),
            CoreError::Io(io_err) => Error::Io(io_err),
        }
    }
}

// Convert from document service errors
impl From<ServiceError> for Error {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::DatabaseNotFound(name) => Error::NotFound(format!("database {}", name)),
            ServiceError::ContainerNotFound(name) => Error::NotFound(format!("table {}", name)),
            ServiceError::ContainerConflict {
                container,
                existing,
                requested,
            } => Error::Conflict(format!(
                "table {} already exists with partition key {} (requested {})",
                container, existing, requested
            )),
            ServiceError::InvalidDocument(msg) => Error::Storage(msg),
            ServiceError::InvalidContinuation(msg) => {
                Error::Storage(format!("continuation rejected: {}", msg))
            }
            ServiceError::Core(core) => core.into(),
            ServiceError::Unauthorized(msg) => Error::Auth(msg),
            ServiceError::Unavailable(msg) => Error::Connectivity(msg),
            ServiceError::Internal(msg) => Error::Internal(msg),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
