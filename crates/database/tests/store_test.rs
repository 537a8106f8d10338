use async_trait::async_trait;
use database::{load_targets, InMemoryTargetStore, StoreError, StoreResult, TargetStore};
use serde_json::json;
use shared::{Coordinate, NewDrop, Target};

/// A store whose backend is always down
struct UnreachableStore;

#[async_trait]
impl TargetStore for UnreachableStore {
    async fn list_targets(&self) -> StoreResult<Vec<Target>> {
        Err(StoreError::Unreachable("connection refused".to_string()))
    }

    async fn get_target(&self, _id: &str) -> StoreResult<Option<Target>> {
        Err(StoreError::Unreachable("connection refused".to_string()))
    }

    async fn insert_drop(&self, _drop: NewDrop) -> StoreResult<Target> {
        Err(StoreError::Unreachable("connection refused".to_string()))
    }
}

fn seeded() -> InMemoryTargetStore {
    InMemoryTargetStore::with_documents(vec![
        json!({
            "id": "core",
            "message": "Golden Glitch behind the server room",
            "latitude": 28.364,
            "longitude": 77.534,
        }),
        json!({
            "id": "library",
            "message": "Floating book, third shelf",
            "location": { "lat": 28.363, "lng": 77.533 },
        }),
        json!({ "id": "broken", "latitude": 28.0 }),
        json!({ "id": "nowhere", "message": "m", "latitude": 120.0, "longitude": 0.0 }),
    ])
}

#[tokio::test]
async fn test_list_skips_malformed_documents() {
    let store = seeded();

    let targets = store.list_targets().await.unwrap();
    let ids: Vec<_> = targets.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["core", "library"]);
    assert_eq!(store.len().await, 4);
}

#[tokio::test]
async fn test_get_target() {
    let store = seeded();

    let library = store.get_target("library").await.unwrap().unwrap();
    assert_eq!(library.coordinate, Coordinate::new(28.363, 77.533));

    assert!(store.get_target("broken").await.unwrap().is_none());
    assert!(store.get_target("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_drop_then_list() {
    let store = InMemoryTargetStore::new();
    assert!(store.is_empty().await);

    let stored = store
        .insert_drop(NewDrop {
            coordinate: Coordinate::new(28.365, 77.535),
            message: "Hidden trophy".to_string(),
        })
        .await
        .unwrap();
    assert!(!stored.id.is_empty());

    let targets = store.list_targets().await.unwrap();
    assert_eq!(targets, vec![stored.clone()]);
    assert_eq!(store.get_target(&stored.id).await.unwrap(), Some(stored));
}

#[tokio::test]
async fn test_insert_rejects_invalid_drops() {
    let store = InMemoryTargetStore::new();

    let empty = store
        .insert_drop(NewDrop {
            coordinate: Coordinate::new(28.365, 77.535),
            message: "   ".to_string(),
        })
        .await;
    assert!(matches!(empty, Err(StoreError::InvalidDrop(_))));

    let out_of_range = store
        .insert_drop(NewDrop {
            coordinate: Coordinate::new(f64::NAN, 77.535),
            message: "lost".to_string(),
        })
        .await;
    assert!(matches!(out_of_range, Err(StoreError::InvalidDrop(_))));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_load_targets_degrades_to_empty() {
    let targets = load_targets(&UnreachableStore).await;
    assert!(targets.is_empty());

    let targets = load_targets(&seeded()).await;
    assert_eq!(targets.len(), 2);
}
