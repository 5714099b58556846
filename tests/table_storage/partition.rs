//! Partition Convention Tests
//!
//! Tests for tables declared as `name/Field` and keys of the form `value/suffix`.

use crate::*;
use async_trait::async_trait;
use tablestore::DocumentService;
use tablestore_core::Document;
use tablestore_storage::{ContainerProperties, QueryPage, QueryRequest, ServiceResult};

#[tokio::test]
async fn test_partition_prefix_round_trip() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&format!("{}/Name", table)).await.unwrap();

    let key = format!("name1/{}", unique_key());
    let mut entity = SampleEntity::new(&key, "name1");
    entity.other_field2 = None;
    storage.upsert_entity(&table, &entity).await.unwrap();

    let second_key = format!("name2/{}", unique_key());
    let mut second = SampleEntity::new(&second_key, "name2");
    second.other_field2 = None;
    storage.upsert_entity(&table, &second).await.unwrap();

    assert!(storage.exists(&table, &key).await.unwrap());

    let retrieved: SampleEntity = storage
        .get_entity(&table, &second_key)
        .await
        .unwrap()
        .unwrap();
    let expected_id = second_key.trim_start_matches("name2/");
    assert_eq!(retrieved.key, expected_id);
    assert_eq!(retrieved.id(), expected_id);
    assert_eq!(retrieved.name.as_deref(), Some("name2"));
    assert_eq!(retrieved.other_field.as_deref(), Some("other1"));
    assert_eq!(retrieved.other_field2, None);

    assert!(storage.delete_entity(&table, &key).await.unwrap());
    assert!(!storage.exists(&table, &key).await.unwrap());
    assert!(storage.exists(&table, &second_key).await.unwrap());
}

#[tokio::test]
async fn test_partition_field_filled_from_prefix() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&format!("{}/Name", table)).await.unwrap();

    let key = format!("v1/{}", unique_key());
    let mut entity = SampleEntity::new(&key, "unused");
    entity.name = None;
    storage.upsert_entity(&table, &entity).await.unwrap();

    let stored: SampleEntity = storage.get_entity(&table, &key).await.unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("v1"));
}

#[tokio::test]
async fn test_partition_prefix_must_match_field() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&format!("{}/Name", table)).await.unwrap();

    let entity = SampleEntity::new(&format!("v1/{}", unique_key()), "v2");
    let result = storage.upsert_entity(&table, &entity).await;
    assert!(matches!(result, Err(Error::InvalidKey(_))));
}

#[tokio::test]
async fn test_key_without_prefix_on_partitioned_table() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&format!("{}/Name", table)).await.unwrap();

    let key = unique_key();
    storage
        .upsert_entity(&table, &SampleEntity::new(&key, "group"))
        .await
        .unwrap();

    // Located by a cross-partition lookup on the id
    assert!(storage.exists(&table, &key).await.unwrap());
    let stored: SampleEntity = storage.get_entity(&table, &key).await.unwrap().unwrap();
    assert_eq!(stored.key, key);
    assert_eq!(storage.count_items_in_partition(&table, "group").await.unwrap(), 1);

    assert!(storage.delete_entity(&table, &key).await.unwrap());
    assert!(!storage.exists(&table, &key).await.unwrap());
    assert!(!storage.delete_entity(&table, &key).await.unwrap());
}

#[tokio::test]
async fn test_prefixed_and_plain_keys_reach_same_entity() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&format!("{}/Name", table)).await.unwrap();

    let id = unique_key();
    storage
        .upsert_entity(&table, &SampleEntity::new(&format!("p/{}", id), "p"))
        .await
        .unwrap();

    assert!(storage.exists(&table, &id).await.unwrap());
    assert!(storage.exists(&table, &format!("p/{}", id)).await.unwrap());
    assert!(!storage.exists(&table, &format!("q/{}", id)).await.unwrap());
}

#[tokio::test]
async fn test_query_partitioned_table() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&format!("{}/Name", table)).await.unwrap();

    let entities: Vec<SampleEntity> = ["a", "a", "b"]
        .iter()
        .map(|p| SampleEntity::new(&format!("{}/{}", p, unique_key()), p))
        .collect();
    storage.upsert_entities(&table, &entities).await.unwrap();

    let found = storage
        .list_entities::<SampleEntity>(&table, ListRequest::new().filter("c.Name = 'a'"))
        .try_collect_vec()
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    for entity in found {
        // Stored keys are the suffix only
        assert!(!entity.key.contains('/'));
    }
}

#[tokio::test]
async fn test_batch_delete_with_prefixed_keys() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&format!("{}/Name", table)).await.unwrap();

    let keys: Vec<String> = (0..4).map(|i| format!("g{}/{}", i % 2, unique_key())).collect();
    let entities: Vec<SampleEntity> = keys
        .iter()
        .map(|k| {
            let mut e = SampleEntity::new(k, "");
            e.name = None;
            e
        })
        .collect();
    storage.upsert_entities(&table, &entities).await.unwrap();

    assert_eq!(storage.delete_entities(&table, &keys).await.unwrap(), 4);
    assert_eq!(storage.count_items(&table).await.unwrap(), 0);
}

// =============================================================================
// Services that return partial pages
// =============================================================================

const DEFERRED: &str = "deferred";

/// Answers the first page of every query with no items and a continuation
struct DeferringService {
    inner: InMemoryDocumentService,
}

#[async_trait]
impl DocumentService for DeferringService {
    async fn authenticate(&self, principal: &ServicePrincipal) -> ServiceResult<()> {
        self.inner.authenticate(principal).await
    }

    async fn ensure_database(&self, database: &str, create: bool) -> ServiceResult<bool> {
        self.inner.ensure_database(database, create).await
    }

    async fn create_container(
        &self,
        database: &str,
        properties: ContainerProperties,
    ) -> ServiceResult<bool> {
        self.inner.create_container(database, properties).await
    }

    async fn read_container(
        &self,
        database: &str,
        container: &str,
    ) -> ServiceResult<Option<ContainerProperties>> {
        self.inner.read_container(database, container).await
    }

    async fn delete_container(&self, database: &str, container: &str) -> ServiceResult<bool> {
        self.inner.delete_container(database, container).await
    }

    async fn list_containers(&self, database: &str) -> ServiceResult<Vec<String>> {
        self.inner.list_containers(database).await
    }

    async fn upsert_document(
        &self,
        database: &str,
        container: &str,
        partition: &PartitionValue,
        document: Document,
    ) -> ServiceResult<()> {
        self.inner
            .upsert_document(database, container, partition, document)
            .await
    }

    async fn read_document(
        &self,
        database: &str,
        container: &str,
        partition: &PartitionValue,
        id: &str,
    ) -> ServiceResult<Option<Document>> {
        self.inner.read_document(database, container, partition, id).await
    }

    async fn delete_document(
        &self,
        database: &str,
        container: &str,
        partition: &PartitionValue,
        id: &str,
    ) -> ServiceResult<bool> {
        self.inner
            .delete_document(database, container, partition, id)
            .await
    }

    async fn query_documents(
        &self,
        database: &str,
        container: &str,
        request: &QueryRequest,
    ) -> ServiceResult<QueryPage> {
        match request.continuation.as_deref() {
            None => Ok(QueryPage {
                items: Vec::new(),
                continuation: Some(DEFERRED.to_string()),
            }),
            Some(DEFERRED) => {
                let fresh = request.clone().resume(None);
                self.inner.query_documents(database, container, &fresh).await
            }
            Some(_) => self.inner.query_documents(database, container, request).await,
        }
    }
}

#[tokio::test]
async fn test_unprefixed_lookup_follows_empty_pages() {
    init_tracing();
    let service = Arc::new(DeferringService {
        inner: InMemoryDocumentService::new(),
    });
    let storage = TableStorage::connect(test_config(), service).await.unwrap();
    let table = unique_table();
    storage.create_table(&format!("{}/Name", table)).await.unwrap();

    let key = unique_key();
    storage
        .upsert_entity(&table, &SampleEntity::new(&key, "group"))
        .await
        .unwrap();

    let listed = storage
        .list_entities::<SampleEntity>(&table, ListRequest::new())
        .count()
        .await
        .unwrap();
    assert_eq!(listed, 1);

    assert!(storage.exists(&table, &key).await.unwrap());
    let stored: SampleEntity = storage.get_entity(&table, &key).await.unwrap().unwrap();
    assert_eq!(stored.key, key);
    assert!(storage.delete_entity(&table, &key).await.unwrap());
    assert!(!storage.exists(&table, &key).await.unwrap());
}
