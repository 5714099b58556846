//! Entity mutation and point lookup.

use crate::error::{BatchFailure, Error, Result};
use crate::locator::{locate, to_document, Location};
use crate::storage::TableStorage;
use crate::stream::materialize;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tablestore_core::document::ID_FIELD;
use tablestore_core::query::Expr;
use tablestore_core::{Document, PartitionValue, SelectQuery, TableItem, TableName};
use tablestore_storage::QueryRequest;
use tracing::{debug, warn};

impl TableStorage {
    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert or replace an entity by key.
    ///
    /// Returns once the write is visible to subsequent reads.
    pub async fn upsert_entity<T: TableItem>(&self, table: &str, entity: &T) -> Result<()> {
        let table = self.resolve_table(table).await?;
        self.write_entity(&table, entity).await
    }

    /// Insert or replace many entities.
    ///
    /// Writes run concurrently, at most `max_batch_concurrency` at a time.
    /// Every entity is attempted; if any fail the result is
    /// [`Error::Batch`] naming each failed key.
    pub async fn upsert_entities<T: TableItem>(&self, table: &str, entities: &[T]) -> Result<()> {
        let table = self.resolve_table(table).await?;
        let outcomes: Vec<(String, Result<()>)> = stream::iter(entities)
            .map(|entity| {
                let table = &table;
                async move {
                    let outcome = self.write_entity(table, entity).await;
                    (entity.key().to_string(), outcome)
                }
            })
            .buffer_unordered(self.config().max_batch_concurrency)
            .collect()
            .await;

        let committed = settle_batch(table.name(), "upsert", outcomes)?;
        debug!(target: "tablestore::entities", table = table.name(), committed, "Upserted batch");
        Ok(())
    }

    /// Delete an entity. Returns `false` when it did not exist.
    pub async fn delete_entity(&self, table: &str, key: &str) -> Result<bool> {
        let table = self.resolve_table(table).await?;
        self.remove_entity(&table, key).await
    }

    /// Delete many entities.
    ///
    /// Same concurrency and failure policy as
    /// [`upsert_entities`](TableStorage::upsert_entities). Keys that do not
    /// exist are not failures. Returns how many entities were removed.
    pub async fn delete_entities<K: AsRef<str> + Sync>(&self, table: &str, keys: &[K]) -> Result<usize> {
        let table = self.resolve_table(table).await?;
        let outcomes: Vec<(String, Result<bool>)> = stream::iter(keys)
            .map(|key| {
                let table = &table;
                async move {
                    let key = key.as_ref();
                    (key.to_string(), self.remove_entity(table, key).await)
                }
            })
            .buffer_unordered(self.config().max_batch_concurrency)
            .collect()
            .await;

        let removed = outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, Ok(true)))
            .count();
        let outcomes = outcomes
            .into_iter()
            .map(|(key, outcome)| (key, outcome.map(|_| ())))
            .collect();
        settle_batch(table.name(), "delete", outcomes)?;
        debug!(target: "tablestore::entities", table = table.name(), removed, "Deleted batch");
        Ok(removed)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Check if an entity exists.
    pub async fn exists(&self, table: &str, key: &str) -> Result<bool> {
        let table = self.resolve_table(table).await?;
        Ok(self.find_document(&table, key).await?.is_some())
    }

    /// Fetch an entity by key, `None` when it does not exist.
    pub async fn get_entity<T: TableItem>(&self, table: &str, key: &str) -> Result<Option<T>> {
        let table = self.resolve_table(table).await?;
        match self.find_document(&table, key).await? {
            Some(document) => Ok(Some(materialize(Value::Object(document))?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn write_entity<T: TableItem>(&self, table: &TableName, entity: &T) -> Result<()> {
        let (partition, document) = to_document(table, entity)?;
        self.service()
            .upsert_document(self.database_name(), table.name(), &partition, document)
            .await?;
        Ok(())
    }

    async fn remove_entity(&self, table: &TableName, key: &str) -> Result<bool> {
        let (partition, id) = match locate(table, key)? {
            Location::Point { partition, id } => (partition, id),
            Location::Scan { id } => match self.scan_by_id(table, &id).await? {
                Some(document) => (partition_of(table, &document), id),
                None => return Ok(false),
            },
        };
        Ok(self
            .service()
            .delete_document(self.database_name(), table.name(), &partition, &id)
            .await?)
    }

    async fn find_document(&self, table: &TableName, key: &str) -> Result<Option<Document>> {
        match locate(table, key)? {
            Location::Point { partition, id } => Ok(self
                .service()
                .read_document(self.database_name(), table.name(), &partition, &id)
                .await?),
            Location::Scan { id } => self.scan_by_id(table, &id).await,
        }
    }

    /// Cross-partition lookup for keys that carry no partition prefix.
    ///
    /// A page may come back empty while more results remain.
    async fn scan_by_id(&self, table: &TableName, id: &str) -> Result<Option<Document>> {
        let query = SelectQuery::select_all()
            .and_where(Expr::field(ID_FIELD).equals(Expr::literal(id)));
        let mut request = QueryRequest::new(query.to_string(), 1);
        loop {
            let page = self
                .service()
                .query_documents(self.database_name(), table.name(), &request)
                .await?;
            match page.items.into_iter().next() {
                Some(Value::Object(document)) => return Ok(Some(document)),
                Some(other) => {
                    return Err(Error::Storage(format!(
                        "lookup of '{}' returned a non-document result: {}",
                        id, other
                    )))
                }
                None if page.continuation.is_none() => return Ok(None),
                None => request = request.resume(page.continuation),
            }
        }
    }
}

fn partition_of(table: &TableName, document: &Document) -> PartitionValue {
    PartitionValue::from_document(document, &table.partition_key_path())
}

/// Fold per-item outcomes into a batch result.
fn settle_batch(table: &str, operation: &str, outcomes: Vec<(String, Result<()>)>) -> Result<usize> {
    let total = outcomes.len();
    let failed: Vec<BatchFailure> = outcomes
        .into_iter()
        .filter_map(|(key, outcome)| {
            outcome.err().map(|e| BatchFailure {
                key,
                reason: e.to_string(),
            })
        })
        .collect();
    let committed = total - failed.len();

    if failed.is_empty() {
        return Ok(committed);
    }
    for failure in &failed {
        warn!(
            target: "tablestore::entities",
            table,
            operation,
            key = %failure.key,
            reason = %failure.reason,
            "Batch item failed"
        );
    }
    Err(Error::Batch { committed, failed })
}
