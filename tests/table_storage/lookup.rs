//! Point Lookup Tests
//!
//! Tests for exists and get_entity.

use crate::*;

#[tokio::test]
async fn test_get_missing_entity_is_none() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&table).await.unwrap();

    let found: Option<SampleEntity> = storage.get_entity(&table, &unique_key()).await.unwrap();
    assert!(found.is_none());
    assert!(!storage.exists(&table, &unique_key()).await.unwrap());
}

#[tokio::test]
async fn test_get_entity_ignores_system_fields() {
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Strict {
        #[serde(rename = "Key")]
        key: String,
        id: String,
    }

    impl TableItem for Strict {
        fn key(&self) -> &str {
            &self.key
        }
    }

    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&table).await.unwrap();

    let entity = Strict {
        key: "k1".into(),
        id: "k1".into(),
    };
    storage.upsert_entity(&table, &entity).await.unwrap();

    let stored: Strict = storage.get_entity(&table, "k1").await.unwrap().unwrap();
    assert_eq!(stored.id, "k1");
}

#[tokio::test]
async fn test_get_entity_as_narrower_type() {
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct NameOnly {
        key: String,
        name: Option<String>,
    }

    impl TableItem for NameOnly {
        fn key(&self) -> &str {
            &self.key
        }
    }

    let storage = create_storage().await;
    let (table, keys) = seeded_table(&storage, 1, "narrow").await;

    let stored: NameOnly = storage.get_entity(&table, &keys[0]).await.unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("narrow"));
}

#[tokio::test]
async fn test_lookup_with_bad_key_is_invalid() {
    let storage = create_storage().await;
    let table = unique_table();
    storage.create_table(&table).await.unwrap();

    let result = storage.get_entity::<SampleEntity>(&table, "a#b").await;
    assert!(matches!(result, Err(Error::InvalidKey(_))));

    let result = storage.exists(&table, "").await;
    assert!(matches!(result, Err(Error::InvalidKey(_))));
}

#[tokio::test]
async fn test_get_entity_with_wrong_shape_is_serialization_error() {
    #[derive(Debug, Serialize, Deserialize)]
    struct Numbered {
        #[serde(rename = "Key")]
        key: String,
        #[serde(rename = "Name")]
        name: u32,
    }

    impl TableItem for Numbered {
        fn key(&self) -> &str {
            &self.key
        }
    }

    let storage = create_storage().await;
    let (table, keys) = seeded_table(&storage, 1, "not a number").await;

    let result = storage.get_entity::<Numbered>(&table, &keys[0]).await;
    assert!(matches!(result, Err(Error::Serialization(_))));
}
