//! # tablestore
//!
//! Table storage over a partitioned document database.
//!
//! tablestore presents a document database as a set of tables holding typed
//! entities. The client shapes requests (queries, partition keys, paging,
//! cancellation) and turns responses back into entities; the database itself
//! sits behind the [`DocumentService`] boundary.
//!
//! ## Quick Start
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use tablestore::prelude::*;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct Customer {
//!     key: String,
//!     name: Option<String>,
//! }
//!
//! impl TableItem for Customer {
//!     fn key(&self) -> &str {
//!         &self.key
//!     }
//! }
//!
//! # async fn run() -> tablestore::Result<()> {
//! let storage = TableStorage::in_memory("Test").await?;
//! storage.create_table("customers").await?;
//!
//! let alice = Customer { key: "c1".into(), name: Some("Alice".into()) };
//! storage.upsert_entity("customers", &alice).await?;
//!
//! let found: Option<Customer> = storage.get_entity("customers", "c1").await?;
//! assert!(found.is_some());
//!
//! let named = storage
//!     .list_entities::<Customer>("customers", ListRequest::new().filter("c.Name = 'Alice'"))
//!     .try_collect_vec()
//!     .await?;
//! assert_eq!(named.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Partitioning
//!
//! A table created as `name/Field` is partitioned by the entity field
//! `Field`. Keys on such a table may carry the partition value as a prefix,
//! `value/suffix`; the entity is then stored under id `suffix` in partition
//! `value`.
//!
//! ## Operations
//!
//! - Tables: [`create_table`](TableStorage::create_table),
//!   [`delete_table`](TableStorage::delete_table),
//!   [`list_table_names`](TableStorage::list_table_names)
//! - Entities: [`upsert_entity`](TableStorage::upsert_entity),
//!   [`upsert_entities`](TableStorage::upsert_entities),
//!   [`delete_entity`](TableStorage::delete_entity),
//!   [`delete_entities`](TableStorage::delete_entities),
//!   [`exists`](TableStorage::exists), [`get_entity`](TableStorage::get_entity)
//! - Queries: [`list_entities`](TableStorage::list_entities) (pull),
//!   [`list_entities_observable`](TableStorage::list_entities_observable) (push)
//! - Counts: [`count_items`](TableStorage::count_items) and variants

#![warn(missing_docs)]

mod counting;
mod entities;
mod error;
mod locator;
mod observable;
mod request;
mod storage;
mod stream;
mod tables;

pub mod prelude;

// Re-export main entry points
pub use error::{BatchFailure, Error, Result};
pub use storage::{TableStorage, TableStorageBuilder};

// Re-export query surfaces
pub use observable::{EntityObservable, Observer, Subscription};
pub use request::ListRequest;
pub use stream::EntityStream;

// Re-export shared types
pub use tablestore_core::{PartitionValue, ServicePrincipal, StorageConfig, TableItem, TableName};
pub use tablestore_storage::{DocumentService, InMemoryDocumentService};
