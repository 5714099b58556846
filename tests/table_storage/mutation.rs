//! Mutation Tests
//!
//! Tests for upsert_entity, upsert_entities, delete_entity and delete_entities.

use crate::*;

// =============================================================================
// UPSERT TESTS
// =============================================================================

#[tokio::test]
async fn test_upsert_then_get_returns_equal_entity() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&table).await.unwrap();

    let entity = SampleEntity::new(&unique_key(), "n");
    storage.upsert_entity(&table, &entity).await.unwrap();

    assert!(storage.exists(&table, &entity.key).await.unwrap());
    let stored: SampleEntity = storage
        .get_entity(&table, &entity.key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, entity);
}

#[tokio::test]
async fn test_upsert_existing_key_replaces_fields() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&table).await.unwrap();

    let key = unique_key();
    let mut entity = SampleEntity::new(&key, "first");
    storage.upsert_entity(&table, &entity).await.unwrap();

    entity.name = Some("second".to_string());
    entity.other_field = None;
    storage.upsert_entity(&table, &entity).await.unwrap();

    let stored: SampleEntity = storage.get_entity(&table, &key).await.unwrap().unwrap();
    assert_eq!(stored.key, key);
    assert_eq!(stored.name.as_deref(), Some("second"));
    assert_eq!(stored.other_field, None);
    assert_eq!(storage.count_items(&table).await.unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_rejects_reserved_characters() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&table).await.unwrap();

    for key in ["", "a#b", "a?b", "a\\b", "a/b"] {
        let result = storage
            .upsert_entity(&table, &SampleEntity::new(key, "n"))
            .await;
        assert!(
            matches!(result, Err(Error::InvalidKey(_))),
            "{:?} should be rejected",
            key
        );
    }
    assert_eq!(storage.count_items(&table).await.unwrap(), 0);
}

#[tokio::test]
async fn test_upsert_entities_writes_all() {
    let storage = create_storage().await;
    let (table, keys) = seeded_table(&storage, 25, "batch").await;

    assert_eq!(storage.count_items(&table).await.unwrap(), 25);
    for key in &keys {
        assert!(storage.exists(&table, key).await.unwrap());
    }
}

#[tokio::test]
async fn test_upsert_entities_reports_every_failure() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&table).await.unwrap();

    let entities = vec![
        SampleEntity::new("good1", "n"),
        SampleEntity::new("bad#1", "n"),
        SampleEntity::new("good2", "n"),
        SampleEntity::new("bad?2", "n"),
    ];
    let err = storage.upsert_entities(&table, &entities).await.unwrap_err();

    match &err {
        Error::Batch { committed, failed } => {
            assert_eq!(*committed, 2);
            let mut keys: Vec<&str> = failed.iter().map(|f| f.key.as_str()).collect();
            keys.sort();
            assert_eq!(keys, vec!["bad#1", "bad?2"]);
        }
        other => panic!("expected batch error, got {:?}", other),
    }

    // Good items committed despite the failures
    assert!(storage.exists(&table, "good1").await.unwrap());
    assert!(storage.exists(&table, "good2").await.unwrap());
}

#[tokio::test]
async fn test_upsert_entities_empty_batch() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&table).await.unwrap();

    let empty: Vec<SampleEntity> = Vec::new();
    storage.upsert_entities(&table, &empty).await.unwrap();
    assert_eq!(storage.count_items(&table).await.unwrap(), 0);
}

// =============================================================================
// DELETE TESTS
// =============================================================================

#[tokio::test]
async fn test_delete_entity() {
    let storage = create_storage().await;
    let (table, keys) = seeded_table(&storage, 2, "n").await;

    assert!(storage.delete_entity(&table, &keys[0]).await.unwrap());
    assert!(!storage.exists(&table, &keys[0]).await.unwrap());
    assert!(storage.exists(&table, &keys[1]).await.unwrap());
}

#[tokio::test]
async fn test_delete_missing_entity_returns_false() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&table).await.unwrap();

    assert!(!storage.delete_entity(&table, &unique_key()).await.unwrap());
}

#[tokio::test]
async fn test_delete_entities() {
    let storage = create_storage().await;
    let (table, keys) = seeded_table(&storage, 10, "n").await;

    let removed = storage.delete_entities(&table, &keys[..6]).await.unwrap();
    assert_eq!(removed, 6);

    for key in &keys[..6] {
        assert!(!storage.exists(&table, key).await.unwrap());
    }
    assert_eq!(storage.count_items(&table).await.unwrap(), 4);
}

#[tokio::test]
async fn test_delete_entities_ignores_missing_keys() {
    let storage = create_storage().await;
    let (table, keys) = seeded_table(&storage, 1, "n").await;

    let keys = vec![keys[0].clone(), unique_key()];
    let removed = storage.delete_entities(&table, &keys).await.unwrap();
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn test_delete_entities_reports_bad_keys() {
    let storage = create_storage().await;
    let (table, keys) = seeded_table(&storage, 1, "n").await;

    let keys = vec![keys[0].as_str(), "bad#key"];
    let err = storage.delete_entities(&table, &keys).await.unwrap_err();
    assert_eq!(err.failed_keys(), vec!["bad#key"]);
    assert_eq!(storage.count_items(&table).await.unwrap(), 0);
}
