//! Errors reported by a document service

use thiserror::Error;

/// Document service failures
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The database does not exist
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    /// The container does not exist
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// A container with the same id exists with a different partition key
    #[error("container {container} exists with partition key {existing}, requested {requested}")]
    ContainerConflict {
        /// Container id
        container: String,
        /// Partition key path already provisioned
        existing: String,
        /// Partition key path requested
        requested: String,
    },

    /// The document was rejected (bad shape, partition mismatch)
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The continuation token could not be decoded
    #[error("invalid continuation token: {0}")]
    InvalidContinuation(String),

    /// Key, query or name validation failed
    #[error(transparent)]
    Core(#[from] tablestore_core::Error),

    /// The principal was rejected
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The service could not be reached
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Anything else
    #[error("internal service error: {0}")]
    Internal(String),
}

/// Result type for document service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// Whether the request may succeed if retried unchanged
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Unavailable(_))
    }
}
