//! Table lifecycle operations.

use crate::error::Result;
use crate::storage::TableStorage;
use tablestore_core::TableName;
use tablestore_storage::ContainerProperties;
use tracing::info;

impl TableStorage {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a table if it does not exist.
    ///
    /// `name` may be compound, `table/PartitionField`, to partition the table
    /// by that entity field. Returns `true` if the table was created and
    /// `false` if it already existed with the same partition field. A table
    /// that exists with a different partition field is a
    /// [`Conflict`](crate::Error::Conflict).
    ///
    /// # Example
    ///
    /// ```
    /// # use tablestore::prelude::*;
    /// # async fn run(storage: TableStorage) -> tablestore::Result<()> {
    /// assert!(storage.create_table("orders/Region").await?);
    /// assert!(!storage.create_table("orders/Region").await?);
    /// assert!(storage.create_table("orders/Customer").await.is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_table(&self, name: &str) -> Result<bool> {
        let table = TableName::parse(name)?;
        let properties = ContainerProperties::new(table.name(), table.partition_key_path());
        let created = self
            .service()
            .create_container(self.database_name(), properties)
            .await?;
        if created {
            info!(
                target: "tablestore::tables",
                table = table.name(),
                partition_key = %table.partition_key_path(),
                "Created table"
            );
        }
        Ok(created)
    }

    /// Delete a table and every entity in it.
    ///
    /// Accepts the compound form; only the table part is used. Returns
    /// `false` when there was no such table.
    pub async fn delete_table(&self, name: &str) -> Result<bool> {
        let table = TableName::parse(name)?;
        let deleted = self
            .service()
            .delete_container(self.database_name(), table.name())
            .await?;
        if deleted {
            info!(target: "tablestore::tables", table = table.name(), "Deleted table");
        }
        Ok(deleted)
    }

    /// Names of all tables in the database.
    pub async fn list_table_names(&self) -> Result<Vec<String>> {
        Ok(self.service().list_containers(self.database_name()).await?)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Check if a table exists.
    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let table = TableName::parse(name)?;
        let properties = self
            .service()
            .read_container(self.database_name(), table.name())
            .await?;
        Ok(properties.is_some())
    }

    /// Partition field the table was created with, `None` for unpartitioned tables.
    pub async fn table_partition_field(&self, name: &str) -> Result<Option<String>> {
        let table = self.resolve_table(name).await?;
        Ok(table.partition_field().map(str::to_string))
    }
}
