//! The document service contract
//!
//! ## Resource Model
//!
//! A service hosts databases; a database hosts containers; a container holds
//! JSON documents addressed by `(partition value, id)`. Each container has a
//! partition key path (`/id` when the table declared no partition field).
//!
//! ## Queries
//!
//! Queries are sent as text (see `tablestore_core::query`) and executed page
//! by page. A page carries an opaque continuation token when more results
//! remain; passing it back in the next request resumes after the last item
//! returned. Count queries return a single page holding one number.
//!
//! ## Error Handling
//!
//! | Condition | Error |
//! |-----------|-------|
//! | Database missing | `DatabaseNotFound` |
//! | Container missing (data plane) | `ContainerNotFound` |
//! | Container re-created with another partition key | `ContainerConflict` |
//! | Document not an object, bad id, partition mismatch | `InvalidDocument` / `Core` |
//! | Unparsable query | `Core` |
//! | Principal rejected | `Unauthorized` |
//! | Service unreachable | `Unavailable` |

use crate::error::ServiceResult;
use async_trait::async_trait;
use serde_json::Value;
use tablestore_core::{Document, PartitionValue, ServicePrincipal};

/// Container (table) metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerProperties {
    /// Container id
    pub id: String,
    /// Partition key path, e.g. `/Name` or `/id`
    pub partition_key_path: String,
}

impl ContainerProperties {
    /// Build container properties
    pub fn new(id: impl Into<String>, partition_key_path: impl Into<String>) -> Self {
        ContainerProperties {
            id: id.into(),
            partition_key_path: partition_key_path.into(),
        }
    }
}

/// One page request of a query
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Query text
    pub query: String,
    /// Restrict execution to one partition (cross-partition when `None`)
    pub partition: Option<PartitionValue>,
    /// Continuation token from the previous page
    pub continuation: Option<String>,
    /// Maximum items in the returned page
    pub max_item_count: usize,
}

impl QueryRequest {
    /// First page of a cross-partition query
    pub fn new(query: impl Into<String>, max_item_count: usize) -> Self {
        QueryRequest {
            query: query.into(),
            partition: None,
            continuation: None,
            max_item_count,
        }
    }

    /// Scope the query to one partition
    pub fn in_partition(mut self, partition: PartitionValue) -> Self {
        self.partition = Some(partition);
        self
    }

    /// Resume from a continuation token
    pub fn resume(mut self, continuation: Option<String>) -> Self {
        self.continuation = continuation;
        self
    }
}

/// One page of query results
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    /// Projected results, in order
    pub items: Vec<Value>,
    /// Token for the next page, `None` on the last page
    pub continuation: Option<String>,
}

impl QueryPage {
    /// Whether more pages remain
    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }
}

/// Control-plane and data-plane operations of a document database.
///
/// Implementations must be safe to share across tasks; the client holds one
/// behind an `Arc` for its whole lifetime.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Verify the principal. Called once when a client connects.
    async fn authenticate(&self, principal: &ServicePrincipal) -> ServiceResult<()>;

    /// Make sure `database` exists, creating it if allowed.
    ///
    /// Returns `true` when the database was created by this call.
    async fn ensure_database(&self, database: &str, create_if_missing: bool)
        -> ServiceResult<bool>;

    /// Create a container. Returns `false` if an identical one already exists.
    async fn create_container(
        &self,
        database: &str,
        properties: ContainerProperties,
    ) -> ServiceResult<bool>;

    /// Read container metadata, `None` if it does not exist.
    async fn read_container(
        &self,
        database: &str,
        container: &str,
    ) -> ServiceResult<Option<ContainerProperties>>;

    /// Delete a container and its documents. Returns `false` if it did not exist.
    async fn delete_container(&self, database: &str, container: &str) -> ServiceResult<bool>;

    /// Ids of all containers in `database`.
    async fn list_containers(&self, database: &str) -> ServiceResult<Vec<String>>;

    /// Insert or replace a document by `(partition, id)`.
    async fn upsert_document(
        &self,
        database: &str,
        container: &str,
        partition: &PartitionValue,
        document: Document,
    ) -> ServiceResult<()>;

    /// Point read, `None` if absent.
    async fn read_document(
        &self,
        database: &str,
        container: &str,
        partition: &PartitionValue,
        id: &str,
    ) -> ServiceResult<Option<Document>>;

    /// Point delete. Returns `false` if absent.
    async fn delete_document(
        &self,
        database: &str,
        container: &str,
        partition: &PartitionValue,
        id: &str,
    ) -> ServiceResult<bool>;

    /// Execute one page of a query.
    async fn query_documents(
        &self,
        database: &str,
        container: &str,
        request: &QueryRequest,
    ) -> ServiceResult<QueryPage>;
}
