//! Convenient imports for tablestore.
//!
//! ```
//! use tablestore::prelude::*;
//! ```

// Main entry point
pub use crate::storage::{TableStorage, TableStorageBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Queries
pub use crate::observable::{EntityObservable, Observer, Subscription};
pub use crate::request::ListRequest;
pub use crate::stream::EntityStream;

// Entities and configuration
pub use tablestore_core::{PartitionValue, ServicePrincipal, StorageConfig, TableItem};

// Cancellation
pub use tokio_util::sync::CancellationToken;
