//! Table Storage Test Suite
//!
//! Exercises the `TableStorage` client end to end against the in-memory
//! document service.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all table storage tests
//! cargo test --test table_storage
//!
//! # Run query tests only
//! cargo test --test table_storage query::
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tablestore::prelude::*;
use tablestore::InMemoryDocumentService;

// Test modules
pub mod connect;
pub mod lookup;
pub mod mutation;
pub mod partition;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Entity used across the suite
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SampleEntity {
    pub key: String,
    pub name: Option<String>,
    pub other_field: Option<String>,
    pub other_field2: Option<i32>,
    #[serde(default)]
    pub other_field3: bool,
}

impl TableItem for SampleEntity {
    fn key(&self) -> &str {
        &self.key
    }
}

impl SampleEntity {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: Some(name.to_string()),
            other_field: Some("other1".to_string()),
            other_field2: Some(7),
            other_field3: true,
        }
    }
}

/// Install a log subscriber once (honours `RUST_LOG`)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Unique table name, safe to create in a shared database
pub fn unique_table() -> String {
    format!("t{}", uuid::Uuid::new_v4().simple())
}

/// Unique key
pub fn unique_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Configuration with placeholder identity
pub fn test_config() -> StorageConfig {
    let mut config = StorageConfig::new(
        "tablestore-test",
        "subscription",
        "Test",
        ServicePrincipal::new("tenant", "app", "secret"),
    );
    config.create_database_if_not_exists = true;
    config
}

/// Client over a fresh in-memory service
pub async fn create_storage() -> TableStorage {
    init_tracing();
    TableStorage::in_memory("Test")
        .await
        .expect("Failed to connect to in-memory service")
}

/// Client with a small page size, to exercise paging
pub async fn create_paged_storage(page_size: usize) -> TableStorage {
    init_tracing();
    TableStorage::builder()
        .config(test_config())
        .service(Arc::new(InMemoryDocumentService::new()))
        .page_size(page_size)
        .connect()
        .await
        .expect("Failed to connect to in-memory service")
}

/// Client plus a handle on the service behind it
pub async fn create_storage_with_service() -> (TableStorage, Arc<InMemoryDocumentService>) {
    init_tracing();
    let service = Arc::new(InMemoryDocumentService::new());
    let storage = TableStorage::connect(test_config(), service.clone())
        .await
        .expect("Failed to connect to in-memory service");
    (storage, service)
}

/// Create a table and fill it with `count` entities named `name`
pub async fn seeded_table(storage: &TableStorage, count: usize, name: &str) -> (String, Vec<String>) {
    let table = unique_table();
    storage.create_table(&table).await.unwrap();
    let entities: Vec<SampleEntity> = (0..count)
        .map(|_| SampleEntity::new(&unique_key(), name))
        .collect();
    storage.upsert_entities(&table, &entities).await.unwrap();
    let keys = entities.into_iter().map(|e| e.key).collect();
    (table, keys)
}
