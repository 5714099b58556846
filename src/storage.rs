//! Main entry point for tablestore.
//!
//! This module provides [`TableStorage`], the client every table and entity
//! operation goes through, and [`TableStorageBuilder`] for configuring it.

use crate::error::{Error, Result};
use std::sync::Arc;
use tablestore_core::{ServicePrincipal, StorageConfig, TableName};
use tablestore_storage::{DocumentService, InMemoryDocumentService};
use tracing::info;

/// Table storage client.
///
/// Cheap to clone: clones share one connection to the document service.
/// Holds no per-table state, so every operation sees the tables as they are
/// on the service at the time of the call.
///
/// # Example
///
/// ```
/// use tablestore::prelude::*;
///
/// # async fn run() -> tablestore::Result<()> {
/// let storage = TableStorage::in_memory("Test").await?;
/// storage.create_table("customers/Region").await?;
/// assert!(storage.table_exists("customers").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TableStorage {
    inner: Arc<Inner>,
}

struct Inner {
    service: Arc<dyn DocumentService>,
    config: StorageConfig,
}

impl TableStorage {
    /// Connect to `service` with the given configuration.
    ///
    /// Validates the configuration, authenticates the principal and makes sure
    /// the database exists (creating it when `create_database_if_not_exists`
    /// is set).
    pub async fn connect(config: StorageConfig, service: Arc<dyn DocumentService>) -> Result<Self> {
        config.validate()?;
        info!(
            target: "tablestore::storage",
            instance = %config.instance_name,
            database = %config.database_name,
            "Connecting to document service"
        );

        service.authenticate(&config.principal()).await?;
        let created = service
            .ensure_database(&config.database_name, config.create_database_if_not_exists)
            .await?;
        if created {
            info!(target: "tablestore::storage", database = %config.database_name, "Created database");
        }

        Ok(Self {
            inner: Arc::new(Inner { service, config }),
        })
    }

    /// Connect to a fresh in-memory document service.
    ///
    /// The database is created on connect. All data is lost when the last
    /// clone of the client is dropped.
    pub async fn in_memory(database: &str) -> Result<Self> {
        let mut config = StorageConfig::new(
            "local",
            "local",
            database,
            ServicePrincipal::new("local", "local", "local"),
        );
        config.create_database_if_not_exists = true;
        Self::connect(config, Arc::new(InMemoryDocumentService::new())).await
    }

    /// Create a builder for client configuration.
    pub fn builder() -> TableStorageBuilder {
        TableStorageBuilder::new()
    }

    /// Configuration this client connected with
    pub fn config(&self) -> &StorageConfig {
        &self.inner.config
    }

    /// Name of the database holding the tables
    pub fn database_name(&self) -> &str {
        &self.inner.config.database_name
    }

    pub(crate) fn service(&self) -> &dyn DocumentService {
        self.inner.service.as_ref()
    }

    /// Look up a table on the service and return its name with the
    /// partition field it was created with.
    pub(crate) async fn resolve_table(&self, raw: &str) -> Result<TableName> {
        let requested = TableName::parse(raw)?;
        let properties = self
            .service()
            .read_container(self.database_name(), requested.name())
            .await?
            .ok_or_else(|| Error::NotFound(format!("table {}", requested.name())))?;
        Ok(TableName::from_partition_key_path(
            &properties.id,
            &properties.partition_key_path,
        )?)
    }
}

impl std::fmt::Debug for TableStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStorage")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Builder for client configuration.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tablestore::prelude::*;
/// use tablestore::InMemoryDocumentService;
///
/// # async fn run() -> tablestore::Result<()> {
/// let config = StorageConfig::new(
///     "orders-dev",
///     "subscription",
///     "Orders",
///     ServicePrincipal::new("tenant", "app", "secret"),
/// );
/// let storage = TableStorage::builder()
///     .config(config)
///     .service(Arc::new(InMemoryDocumentService::new()))
///     .create_database_if_not_exists(true)
///     .page_size(50)
///     .connect()
///     .await?;
/// assert_eq!(storage.config().page_size, 50);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct TableStorageBuilder {
    config: Option<StorageConfig>,
    service: Option<Arc<dyn DocumentService>>,
    create_database: Option<bool>,
    page_size: Option<usize>,
    max_batch_concurrency: Option<usize>,
    default_group_field: Option<String>,
}

impl TableStorageBuilder {
    /// Create a new builder with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base configuration.
    pub fn config(mut self, config: StorageConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the document service to connect to.
    pub fn service(mut self, service: Arc<dyn DocumentService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Override `create_database_if_not_exists`.
    pub fn create_database_if_not_exists(mut self, create: bool) -> Self {
        self.create_database = Some(create);
        self
    }

    /// Override the query page size.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Override the number of concurrent writes in batch operations.
    pub fn max_batch_concurrency(mut self, max: usize) -> Self {
        self.max_batch_concurrency = Some(max);
        self
    }

    /// Override the group field used by partition counts on unpartitioned tables.
    pub fn default_group_field(mut self, field: impl Into<String>) -> Self {
        self.default_group_field = Some(field.into());
        self
    }

    /// Apply overrides and connect.
    pub async fn connect(self) -> Result<TableStorage> {
        let mut config = self
            .config
            .ok_or_else(|| Error::Config("no configuration supplied".into()))?;
        let service = self
            .service
            .ok_or_else(|| Error::Config("no document service supplied".into()))?;

        if let Some(create) = self.create_database {
            config.create_database_if_not_exists = create;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(max) = self.max_batch_concurrency {
            config.max_batch_concurrency = max;
        }
        if let Some(field) = self.default_group_field {
            config.default_group_field = field;
        }
        TableStorage::connect(config, service).await
    }
}
