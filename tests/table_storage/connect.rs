//! Connection and Configuration Tests
//!
//! Tests for connect, the builder, authentication and service outages.

use crate::*;
use std::io::Write;

#[tokio::test]
async fn test_connect_creates_database_when_allowed() {
    init_tracing();
    let service = Arc::new(InMemoryDocumentService::new());

    let storage = TableStorage::connect(test_config(), service.clone())
        .await
        .unwrap();
    assert_eq!(storage.database_name(), "Test");
    assert!(storage.create_table(&unique_table()).await.unwrap());
}

#[tokio::test]
async fn test_connect_missing_database_without_auto_create() {
    init_tracing();
    let mut config = test_config();
    config.create_database_if_not_exists = false;

    let result = TableStorage::connect(config, Arc::new(InMemoryDocumentService::new())).await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_connect_rejects_unknown_principal() {
    init_tracing();
    let service = InMemoryDocumentService::new()
        .with_principal(ServicePrincipal::new("tenant", "app", "other-secret"));

    let err = TableStorage::connect(test_config(), Arc::new(service))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
    assert!(err.is_connectivity());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_connect_accepts_registered_principal() {
    init_tracing();
    let service = InMemoryDocumentService::new()
        .with_principal(ServicePrincipal::new("tenant", "app", "secret"));

    assert!(TableStorage::connect(test_config(), Arc::new(service))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_connect_to_unavailable_service() {
    init_tracing();
    let service = Arc::new(InMemoryDocumentService::new());
    service.set_available(false);

    let err = TableStorage::connect(test_config(), service).await.unwrap_err();
    assert!(matches!(err, Error::Connectivity(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_outage_after_connect() {
    let (storage, service) = create_storage_with_service().await;
    let (table, keys) = seeded_table(&storage, 2, "n").await;

    service.set_available(false);
    let err = storage.exists(&table, &keys[0]).await.unwrap_err();
    assert!(err.is_retryable());
    let err = storage
        .list_entities::<SampleEntity>(&table, ListRequest::new())
        .try_collect_vec()
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    service.set_available(true);
    assert!(storage.exists(&table, &keys[0]).await.unwrap());
}

#[tokio::test]
async fn test_invalid_config_fails_before_connecting() {
    init_tracing();
    let service = Arc::new(InMemoryDocumentService::new());
    service.set_available(false);

    // Config errors win over the outage: nothing is sent
    let err = TableStorage::builder()
        .config(test_config())
        .service(service)
        .page_size(0)
        .connect()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_builder_requires_service_and_config() {
    let err = TableStorage::builder()
        .config(test_config())
        .connect()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let err = TableStorage::builder()
        .service(Arc::new(InMemoryDocumentService::new()))
        .connect()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_connect_from_config_file() {
    init_tracing();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
instance_name = "orders-dev"
tenant_id = "tenant"
subscription_id = "subscription"
database_name = "Orders"
app_id = "app"
app_secret = "secret"
create_database_if_not_exists = true
page_size = 3
"#
    )
    .unwrap();

    let config = StorageConfig::from_file(file.path()).unwrap();
    let storage = TableStorage::connect(config, Arc::new(InMemoryDocumentService::new()))
        .await
        .unwrap();
    assert_eq!(storage.database_name(), "Orders");
    assert_eq!(storage.config().page_size, 3);
}

#[tokio::test]
async fn test_clones_share_the_connection() {
    let storage = create_storage().await;
    let clone = storage.clone();
    let table = unique_table();

    storage.create_table(&table).await.unwrap();
    assert!(clone.table_exists(&table).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_operations_from_tasks() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&table).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let storage = storage.clone();
        let table = table.clone();
        handles.push(tokio::spawn(async move {
            let entity = SampleEntity::new(&format!("k{}", i), "n");
            storage.upsert_entity(&table, &entity).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(storage.count_items(&table).await.unwrap(), 8);
}
