//! Counting operations.
//!
//! Counts run as `SELECT VALUE COUNT(1)` queries on the service; only the
//! number travels back. Results from every page are summed, since a service
//! may return partial aggregates per page.

use crate::error::{Error, Result};
use crate::storage::TableStorage;
use serde_json::Value;
use tablestore_core::query::Expr;
use tablestore_core::{PartitionValue, SelectQuery};
use tablestore_storage::QueryRequest;
use tokio_util::sync::CancellationToken;
use tracing::debug;

impl TableStorage {
    /// Count every entity in a table.
    pub async fn count_items(&self, table: &str) -> Result<u64> {
        self.count_matching(table, SelectQuery::select_all()).await
    }

    /// Count every entity in a table, giving up with [`Error::Cancelled`]
    /// once `token` is cancelled.
    pub async fn count_items_cancellable(
        &self,
        table: &str,
        token: &CancellationToken,
    ) -> Result<u64> {
        with_cancellation(Some(token), self.count_items(table)).await
    }

    /// Count every entity in a table and hand the result to `callback`.
    ///
    /// The callback runs exactly once, after the count is complete. It is not
    /// called if counting fails.
    pub async fn count_items_with<F>(&self, table: &str, callback: F) -> Result<()>
    where
        F: FnOnce(u64) + Send,
    {
        let count = self.count_items(table).await?;
        callback(count);
        Ok(())
    }

    /// Count the entities sharing a partition (group) value.
    ///
    /// On a partitioned table the count is scoped to that partition. On an
    /// unpartitioned table entities are grouped by the configured
    /// `default_group_field` instead.
    pub async fn count_items_in_partition(
        &self,
        table: &str,
        value: impl Into<PartitionValue>,
    ) -> Result<u64> {
        let resolved = self.resolve_table(table).await?;
        let value = value.into();
        match resolved.partition_field() {
            Some(_) => {
                self.run_count(resolved.name(), SelectQuery::select_all(), Some(value))
                    .await
            }
            None => {
                let field = &self.config().default_group_field;
                let group = Expr::field(field.as_str()).equals(Expr::literal(value.value().clone()));
                let query = SelectQuery::select_all().and_where(group);
                self.run_count(resolved.name(), query, None).await
            }
        }
    }

    /// Count the entities matching a filter.
    ///
    /// `query` accepts the same forms as [`ListRequest::filter`](crate::ListRequest::filter).
    pub async fn count_items_query(
        &self,
        table: &str,
        query: &str,
        token: Option<&CancellationToken>,
    ) -> Result<u64> {
        let query = SelectQuery::from_filter(query)?;
        with_cancellation(token, self.count_matching(table, query)).await
    }

    async fn count_matching(&self, table: &str, query: SelectQuery) -> Result<u64> {
        let resolved = self.resolve_table(table).await?;
        self.run_count(resolved.name(), query, None).await
    }

    async fn run_count(
        &self,
        container: &str,
        query: SelectQuery,
        partition: Option<PartitionValue>,
    ) -> Result<u64> {
        let text = query.into_count().to_string();
        let mut request = QueryRequest::new(text, self.config().page_size);
        request.partition = partition;

        let mut total = 0u64;
        loop {
            let page = self
                .service()
                .query_documents(self.database_name(), container, &request)
                .await?;
            for item in &page.items {
                total += count_value(item)?;
            }
            if !page.has_more() {
                break;
            }
            request = request.resume(page.continuation);
        }

        debug!(target: "tablestore::count", table = container, total, "Counted");
        Ok(total)
    }
}

/// Race `operation` against `token`; a cancelled token wins.
async fn with_cancellation<F>(token: Option<&CancellationToken>, operation: F) -> Result<u64>
where
    F: std::future::Future<Output = Result<u64>>,
{
    match token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(Error::Cancelled),
            result = operation => result,
        },
        None => operation.await,
    }
}

fn count_value(item: &Value) -> Result<u64> {
    let number = match item {
        Value::Object(map) => map.values().next(),
        other => Some(other),
    };
    number
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::Storage(format!("count query returned {}", item)))
}
