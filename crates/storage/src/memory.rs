//! In-memory document service
//!
//! Implements [`DocumentService`] entirely in process. Used by the test
//! suites and for local development without a provisioned database.
//!
//! # Design
//!
//! - DashMap of databases, each a DashMap of containers: creating or dropping
//!   one container never blocks traffic on another
//! - Per-container `RwLock<BTreeMap>` keyed by `(partition, id)`: point reads
//!   share the lock, writes take it briefly, scans see a stable order
//! - Queries are re-evaluated per page; continuation tokens encode the key of
//!   the last result returned, so writes between pages never shift a scan
//!
//! Every write stamps `_ts` (seconds since the epoch) and `_etag` (a fresh
//! UUID) onto the stored document, mirroring what a hosted service does.

use crate::error::{ServiceError, ServiceResult};
use crate::service::{ContainerProperties, DocumentService, QueryPage, QueryRequest};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tablestore_core::document::ID_FIELD;
use tablestore_core::key::validate_id;
use tablestore_core::query::{matches, project};
use tablestore_core::{Document, PartitionValue, SelectQuery, ServicePrincipal};
use tracing::{debug, trace};

/// `(canonical partition value, id)`
type DocumentKey = (String, String);

/// One container: its properties and documents
#[derive(Debug)]
struct Container {
    properties: ContainerProperties,
    documents: RwLock<BTreeMap<DocumentKey, Document>>,
}

impl Container {
    fn new(properties: ContainerProperties) -> Self {
        Self {
            properties,
            documents: RwLock::new(BTreeMap::new()),
        }
    }
}

/// One database: its containers
#[derive(Debug, Default)]
struct Database {
    containers: DashMap<String, Arc<Container>>,
}

/// In-process [`DocumentService`]
///
/// # Example
///
/// ```
/// use tablestore_storage::{ContainerProperties, DocumentService, InMemoryDocumentService};
///
/// # tokio_test_block(async {
/// let service = InMemoryDocumentService::new();
/// service.ensure_database("Test", true).await.unwrap();
/// let created = service
///     .create_container("Test", ContainerProperties::new("orders", "/id"))
///     .await
///     .unwrap();
/// assert!(created);
/// # });
/// # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug)]
pub struct InMemoryDocumentService {
    databases: DashMap<String, Arc<Database>>,
    /// Accepted principals; empty accepts any complete principal
    principals: RwLock<Vec<ServicePrincipal>>,
    available: AtomicBool,
}

impl InMemoryDocumentService {
    /// Create an empty service
    pub fn new() -> Self {
        Self {
            databases: DashMap::new(),
            principals: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Only accept the given principal (may be called repeatedly to allow several)
    pub fn with_principal(self, principal: ServicePrincipal) -> Self {
        self.principals.write().push(principal);
        self
    }

    /// Toggle availability. While unavailable every call fails with
    /// [`ServiceError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Number of documents stored in a container, `None` if it does not exist
    pub fn document_count(&self, database: &str, container: &str) -> Option<usize> {
        let db = self.databases.get(database)?;
        let container = db.containers.get(container)?;
        let count = container.documents.read().len();
        Some(count)
    }

    fn check_available(&self) -> ServiceResult<()> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ServiceError::Unavailable(
                "in-memory service is offline".to_string(),
            ))
        }
    }

    fn database(&self, name: &str) -> ServiceResult<Arc<Database>> {
        self.databases
            .get(name)
            .map(|db| Arc::clone(db.value()))
            .ok_or_else(|| ServiceError::DatabaseNotFound(name.to_string()))
    }

    fn container(&self, database: &str, container: &str) -> ServiceResult<Arc<Container>> {
        let db = self.database(database)?;
        let found = db
            .containers
            .get(container)
            .map(|c| Arc::clone(c.value()))
            .ok_or_else(|| ServiceError::ContainerNotFound(container.to_string()));
        found
    }
}

impl Default for InMemoryDocumentService {
    fn default() -> Self {
        Self::new()
    }
}

fn require_scalar(partition: &PartitionValue) -> ServiceResult<()> {
    if partition.is_scalar() {
        Ok(())
    } else {
        Err(ServiceError::InvalidDocument(format!(
            "partition value {} is not a scalar",
            partition
        )))
    }
}

fn encode_continuation(last: &DocumentKey) -> ServiceResult<String> {
    let anchor = serde_json::to_vec(last)
        .map_err(|e| ServiceError::Internal(format!("failed to encode continuation: {}", e)))?;
    Ok(STANDARD.encode(anchor))
}

fn decode_continuation(token: &str) -> ServiceResult<DocumentKey> {
    let bytes = STANDARD
        .decode(token)
        .map_err(|e| ServiceError::InvalidContinuation(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::InvalidContinuation(e.to_string()))
}

#[async_trait]
impl DocumentService for InMemoryDocumentService {
    async fn authenticate(&self, principal: &ServicePrincipal) -> ServiceResult<()> {
        self.check_available()?;
        if principal.tenant_id.is_empty()
            || principal.app_id.is_empty()
            || principal.app_secret.is_empty()
        {
            return Err(ServiceError::Unauthorized(
                "principal is incomplete".to_string(),
            ));
        }
        let principals = self.principals.read();
        if principals.is_empty() || principals.iter().any(|p| p == principal) {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized(format!(
                "application {} is not authorized",
                principal.app_id
            )))
        }
    }

    async fn ensure_database(
        &self,
        database: &str,
        create_if_missing: bool,
    ) -> ServiceResult<bool> {
        self.check_available()?;
        if self.databases.contains_key(database) {
            return Ok(false);
        }
        if !create_if_missing {
            return Err(ServiceError::DatabaseNotFound(database.to_string()));
        }
        let mut created = false;
        self.databases
            .entry(database.to_string())
            .or_insert_with(|| {
                created = true;
                Arc::new(Database::default())
            });
        if created {
            debug!(target: "tablestore::memory", database, "Created database");
        }
        Ok(created)
    }

    async fn create_container(
        &self,
        database: &str,
        properties: ContainerProperties,
    ) -> ServiceResult<bool> {
        self.check_available()?;
        let db = self.database(database)?;
        // Check and insert under one shard lock
        let result = match db.containers.entry(properties.id.clone()) {
            Entry::Occupied(entry) => {
                let existing = &entry.get().properties;
                if existing.partition_key_path == properties.partition_key_path {
                    Ok(false)
                } else {
                    Err(ServiceError::ContainerConflict {
                        container: properties.id.clone(),
                        existing: existing.partition_key_path.clone(),
                        requested: properties.partition_key_path,
                    })
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Container::new(properties)));
                Ok(true)
            }
        };
        result
    }

    async fn read_container(
        &self,
        database: &str,
        container: &str,
    ) -> ServiceResult<Option<ContainerProperties>> {
        self.check_available()?;
        let db = self.database(database)?;
        let properties = db.containers.get(container).map(|c| c.properties.clone());
        Ok(properties)
    }

    async fn delete_container(&self, database: &str, container: &str) -> ServiceResult<bool> {
        self.check_available()?;
        let db = self.database(database)?;
        let removed = db.containers.remove(container).is_some();
        Ok(removed)
    }

    async fn list_containers(&self, database: &str) -> ServiceResult<Vec<String>> {
        self.check_available()?;
        let db = self.database(database)?;
        let mut ids: Vec<String> = db.containers.iter().map(|c| c.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }

    async fn upsert_document(
        &self,
        database: &str,
        container: &str,
        partition: &PartitionValue,
        mut document: Document,
    ) -> ServiceResult<()> {
        self.check_available()?;
        let container = self.container(database, container)?;
        require_scalar(partition)?;

        let id = match document.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            _ => {
                return Err(ServiceError::InvalidDocument(
                    "document has no string 'id' field".to_string(),
                ))
            }
        };
        validate_id(&id)?;

        let stored_partition =
            PartitionValue::from_document(&document, &container.properties.partition_key_path);
        if stored_partition != *partition {
            return Err(ServiceError::InvalidDocument(format!(
                "partition key {} does not match document value {} at {}",
                partition, stored_partition, container.properties.partition_key_path
            )));
        }

        document.insert("_ts".to_string(), json!(chrono::Utc::now().timestamp()));
        document.insert(
            "_etag".to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );

        trace!(target: "tablestore::memory", container = %container.properties.id, %id, "Upsert");
        container
            .documents
            .write()
            .insert((partition.canonical(), id), document);
        Ok(())
    }

    async fn read_document(
        &self,
        database: &str,
        container: &str,
        partition: &PartitionValue,
        id: &str,
    ) -> ServiceResult<Option<Document>> {
        self.check_available()?;
        let container = self.container(database, container)?;
        validate_id(id)?;
        let key = (partition.canonical(), id.to_string());
        let found = container.documents.read().get(&key).cloned();
        Ok(found)
    }

    async fn delete_document(
        &self,
        database: &str,
        container: &str,
        partition: &PartitionValue,
        id: &str,
    ) -> ServiceResult<bool> {
        self.check_available()?;
        let container = self.container(database, container)?;
        validate_id(id)?;
        let key = (partition.canonical(), id.to_string());
        let removed = container.documents.write().remove(&key).is_some();
        Ok(removed)
    }

    async fn query_documents(
        &self,
        database: &str,
        container: &str,
        request: &QueryRequest,
    ) -> ServiceResult<QueryPage> {
        self.check_available()?;
        let container = self.container(database, container)?;
        let query = SelectQuery::parse(&request.query)?;
        let partition = request.partition.as_ref().map(PartitionValue::canonical);

        let after = match &request.continuation {
            Some(token) => Some(decode_continuation(token)?),
            None => None,
        };
        let max = request.max_item_count.max(1);

        let (items, last, more) = {
            let documents = container.documents.read();
            let in_partition = |key: &DocumentKey| partition.as_ref().map_or(true, |want| *want == key.0);

            if query.is_count() {
                let count = documents
                    .iter()
                    .filter(|(key, doc)| in_partition(key) && matches(query.filter.as_ref(), doc))
                    .count();
                let value = if query.value {
                    json!(count)
                } else {
                    json!({ "$1": count })
                };
                return Ok(QueryPage {
                    items: vec![value],
                    continuation: None,
                });
            }

            let lower = match after {
                Some(key) => Bound::Excluded(key),
                None => Bound::Unbounded,
            };
            let mut in_scope = documents
                .range((lower, Bound::Unbounded))
                .filter(|(key, doc)| in_partition(key) && matches(query.filter.as_ref(), doc))
                .filter_map(|(key, doc)| project(&query, doc).map(|value| (key, value)));

            let mut items = Vec::new();
            let mut last = None;
            for (key, value) in in_scope.by_ref().take(max) {
                last = Some(key.clone());
                items.push(value);
            }
            let more = in_scope.next().is_some();
            (items, last, more)
        };

        let continuation = match last {
            Some(last) if more => Some(encode_continuation(&last)?),
            _ => None,
        };

        debug!(
            target: "tablestore::memory",
            container = %container.properties.id,
            resumed = request.continuation.is_some(),
            returned = items.len(),
            more = continuation.is_some(),
            "Query page"
        );
        Ok(QueryPage {
            items,
            continuation,
        })
    }
}
