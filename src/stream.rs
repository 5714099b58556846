//! Lazy, paged entity streams.
//!
//! A [`PageCursor`] walks a query page by page, buffering one page at a time.
//! Nothing is sent to the service until the first item is requested, and a
//! cancelled request stops the cursor before the next page is fetched.

use crate::error::{Error, Result};
use crate::request::ListRequest;
use crate::storage::TableStorage;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tablestore_core::document::strip_system_fields;
use tablestore_core::TableItem;
use tablestore_storage::QueryRequest;
use tracing::{debug, warn};

/// Cursor over the pages of one query run.
pub(crate) struct PageCursor {
    storage: TableStorage,
    table: String,
    request: ListRequest,
    /// `(container, query text)`, resolved on the first fetch
    resolved: Option<(String, String)>,
    buffer: VecDeque<Value>,
    continuation: Option<String>,
    pages: usize,
    exhausted: bool,
}

impl PageCursor {
    pub(crate) fn new(storage: TableStorage, table: &str, request: ListRequest) -> Self {
        Self {
            storage,
            table: table.to_string(),
            request,
            resolved: None,
            buffer: VecDeque::new(),
            continuation: None,
            pages: 0,
            exhausted: false,
        }
    }

    /// Next raw result, fetching a page when the buffer runs dry.
    ///
    /// Returns `Ok(None)` at the end of the results or once the request is
    /// cancelled.
    pub(crate) async fn next_value(&mut self) -> Result<Option<Value>> {
        loop {
            if self.exhausted {
                return Ok(None);
            }
            if self.request.is_cancelled() {
                warn!(
                    target: "tablestore::query",
                    table = %self.table,
                    pages = self.pages,
                    "Listing cancelled"
                );
                self.exhausted = true;
                self.buffer.clear();
                return Ok(None);
            }
            if let Some(value) = self.buffer.pop_front() {
                return Ok(Some(value));
            }
            if self.pages > 0 && self.continuation.is_none() {
                self.exhausted = true;
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    async fn fetch_page(&mut self) -> Result<()> {
        if self.resolved.is_none() {
            let table = self.storage.resolve_table(&self.table).await?;
            let query = self.request.to_query()?;
            self.resolved = Some((table.name().to_string(), query.to_string()));
        }
        let (container, query) = match &self.resolved {
            Some(resolved) => resolved,
            None => return Err(Error::Internal("query was not resolved".into())),
        };

        let request = QueryRequest::new(query.as_str(), self.storage.config().page_size)
            .resume(self.continuation.take());
        let page = self
            .storage
            .service()
            .query_documents(self.storage.database_name(), container, &request)
            .await?;
        self.pages += 1;

        debug!(
            target: "tablestore::query",
            table = %container,
            page = self.pages,
            items = page.items.len(),
            more = page.has_more(),
            "Fetched page"
        );
        self.continuation = page.continuation;
        self.buffer.extend(page.items);
        Ok(())
    }
}

/// Turn a raw result into an entity.
pub(crate) fn materialize<T: TableItem>(value: Value) -> Result<T> {
    let value = match value {
        Value::Object(mut doc) => {
            strip_system_fields(&mut doc);
            Value::Object(doc)
        }
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}

async fn next_entity<T: TableItem>(mut cursor: PageCursor) -> Result<Option<(T, PageCursor)>> {
    match cursor.next_value().await? {
        Some(value) => Ok(Some((materialize(value)?, cursor))),
        None => Ok(None),
    }
}

/// A lazy stream of entities.
///
/// Yields `Result<T>` items; the first error ends the stream. Returned by
/// [`TableStorage::list_entities`].
///
/// # Example
///
/// ```
/// # use tablestore::prelude::*;
/// # use futures::StreamExt;
/// # #[derive(serde::Serialize, serde::Deserialize)]
/// # struct Customer { #[serde(rename = "Key")] key: String }
/// # impl TableItem for Customer { fn key(&self) -> &str { &self.key } }
/// # async fn run(storage: TableStorage) -> tablestore::Result<()> {
/// let mut customers = storage.list_entities::<Customer>("customers", ListRequest::new());
/// while let Some(customer) = customers.next().await {
///     println!("{}", customer?.key);
/// }
/// # Ok(())
/// # }
/// ```
#[must_use = "streams do nothing unless polled"]
pub struct EntityStream<T> {
    inner: BoxStream<'static, Result<T>>,
}

impl<T: TableItem> EntityStream<T> {
    pub(crate) fn new(cursor: PageCursor) -> Self {
        Self {
            inner: stream::try_unfold(cursor, next_entity::<T>).boxed(),
        }
    }

    /// First entity, or [`Error::NoElement`] when there is none.
    pub async fn first(mut self) -> Result<T> {
        match self.next().await {
            Some(item) => item,
            None => Err(Error::NoElement),
        }
    }

    /// First entity, or `None` when there is none.
    pub async fn first_or_none(mut self) -> Result<Option<T>> {
        self.next().await.transpose()
    }

    /// Collect every entity.
    pub async fn try_collect_vec(self) -> Result<Vec<T>> {
        self.try_collect().await
    }

    /// Number of entities, consuming the stream.
    pub async fn count(mut self) -> Result<usize> {
        let mut count = 0;
        while let Some(item) = self.next().await {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

impl<T> Stream for EntityStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl TableStorage {
    /// List entities lazily.
    ///
    /// No request is sent until the stream is polled. Pages of
    /// `page_size` documents are fetched as the caller consumes them; once the
    /// request's token is cancelled the stream ends without an error.
    ///
    /// A missing table or an unparsable filter surfaces as the first item.
    pub fn list_entities<T: TableItem>(&self, table: &str, request: ListRequest) -> EntityStream<T> {
        EntityStream::new(PageCursor::new(self.clone(), table, request))
    }
}
