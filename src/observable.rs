//! Push-based entity listing.
//!
//! An [`EntityObservable`] describes a listing; nothing runs until it is
//! subscribed. Every subscription starts its own run on the tokio runtime,
//! pushing each entity to the observer as pages arrive and completing when
//! the results are exhausted.

use crate::error::{Error, Result};
use crate::request::ListRequest;
use crate::storage::TableStorage;
use crate::stream::{materialize, PageCursor};
use std::marker::PhantomData;
use tablestore_core::TableItem;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Receives notifications from a subscription.
///
/// `on_error` and `on_completed` are terminal: exactly one of them is called,
/// unless the subscription is disposed first, in which case neither is.
pub trait Observer<T>: Send + 'static {
    /// An entity arrived.
    fn on_next(&mut self, item: T);

    /// The run failed.
    fn on_error(&mut self, _error: &Error) {}

    /// All entities were delivered.
    fn on_completed(&mut self) {}
}

/// Observer built from an `on_next` closure.
struct FnObserver<F>(F);

impl<T, F> Observer<T> for FnObserver<F>
where
    F: FnMut(T) + Send + 'static,
{
    fn on_next(&mut self, item: T) {
        (self.0)(item)
    }
}

/// A cold, multi-subscriber listing of entities.
///
/// Returned by [`TableStorage::list_entities_observable`].
///
/// # Example
///
/// ```
/// # use tablestore::prelude::*;
/// # #[derive(serde::Serialize, serde::Deserialize)]
/// # struct Customer { #[serde(rename = "Key")] key: String }
/// # impl TableItem for Customer { fn key(&self) -> &str { &self.key } }
/// # async fn run(storage: TableStorage) -> tablestore::Result<()> {
/// let observable = storage.list_entities_observable::<Customer>("customers", ListRequest::new());
/// let subscription = observable.subscribe(|customer| println!("{}", customer.key));
/// let delivered = subscription.completion().await?;
/// # Ok(())
/// # }
/// ```
pub struct EntityObservable<T> {
    storage: TableStorage,
    table: String,
    request: ListRequest,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityObservable<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            table: self.table.clone(),
            request: self.request.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: TableItem> EntityObservable<T> {
    /// Subscribe with a closure called once per entity.
    ///
    /// Must be called within a tokio runtime.
    pub fn subscribe<F>(&self, on_next: F) -> Subscription
    where
        F: FnMut(T) + Send + 'static,
    {
        self.subscribe_observer(FnObserver(on_next))
    }

    /// Subscribe with a full observer.
    ///
    /// Must be called within a tokio runtime.
    pub fn subscribe_observer<O: Observer<T>>(&self, observer: O) -> Subscription {
        let disposed = CancellationToken::new();
        let cursor = PageCursor::new(self.storage.clone(), &self.table, self.request.clone());
        let handle = tokio::spawn(run::<T, O>(cursor, observer, disposed.clone()));
        Subscription { disposed, handle }
    }
}

async fn run<T, O>(mut cursor: PageCursor, mut observer: O, disposed: CancellationToken) -> Result<usize>
where
    T: TableItem,
    O: Observer<T>,
{
    let mut emitted = 0;
    loop {
        let next = tokio::select! {
            biased;
            _ = disposed.cancelled() => {
                debug!(target: "tablestore::query", emitted, "Subscription disposed");
                return Ok(emitted);
            }
            next = cursor.next_value() => next,
        };

        let entity = match next.and_then(|value| value.map(materialize::<T>).transpose()) {
            Ok(Some(entity)) => entity,
            Ok(None) => {
                observer.on_completed();
                return Ok(emitted);
            }
            Err(error) => {
                observer.on_error(&error);
                return Err(error);
            }
        };

        if disposed.is_cancelled() {
            return Ok(emitted);
        }
        observer.on_next(entity);
        emitted += 1;
    }
}

/// Handle to one subscription.
///
/// Dropping the handle leaves the run going; call
/// [`unsubscribe`](Subscription::unsubscribe) to stop it.
#[derive(Debug)]
pub struct Subscription {
    disposed: CancellationToken,
    handle: JoinHandle<Result<usize>>,
}

impl Subscription {
    /// Stop delivering entities. No further notifications are sent.
    pub fn unsubscribe(&self) {
        self.disposed.cancel();
    }

    /// Whether the run has finished or been disposed.
    pub fn is_closed(&self) -> bool {
        self.disposed.is_cancelled() || self.handle.is_finished()
    }

    /// Wait for the run to end.
    ///
    /// Returns the number of entities delivered, or the error that ended the run.
    pub async fn completion(self) -> Result<usize> {
        self.handle
            .await
            .map_err(|e| Error::Internal(format!("subscription task failed: {}", e)))?
    }
}

impl TableStorage {
    /// List entities as an observable.
    ///
    /// Takes the same inputs as [`list_entities`](TableStorage::list_entities).
    /// Each subscription runs the query independently.
    pub fn list_entities_observable<T: TableItem>(
        &self,
        table: &str,
        request: ListRequest,
    ) -> EntityObservable<T> {
        EntityObservable {
            storage: self.clone(),
            table: table.to_string(),
            request,
            _entity: PhantomData,
        }
    }
}
