// Target store - where drops live between hunts

use crate::error::{StoreError, StoreResult};
use crate::ingest::{drop_document, ingest_documents, parse_target};
use crate::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use shared::{NewDrop, Target};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Every well-formed drop. Malformed documents are skipped, not errors.
    async fn list_targets(&self) -> StoreResult<Vec<Target>>;

    async fn get_target(&self, id: &str) -> StoreResult<Option<Target>>;

    /// Persist a new drop; the store assigns its id and timestamp
    async fn insert_drop(&self, drop: NewDrop) -> StoreResult<Target>;
}

/// Fetch targets for the map, degrading to an empty list when the store fails
pub async fn load_targets(store: &dyn TargetStore) -> Vec<Target> {
    match store.list_targets().await {
        Ok(targets) => {
            info!("Loaded {} targets", targets.len());
            targets
        }
        Err(e) => {
            error!("Failed to load targets: {}", e);
            Vec::new()
        }
    }
}

fn validate_drop(drop: &NewDrop) -> StoreResult<()> {
    if drop.message.trim().is_empty() {
        return Err(StoreError::InvalidDrop("message is empty".to_string()));
    }
    if !drop.coordinate.is_within_bounds() {
        return Err(StoreError::InvalidDrop(format!(
            "coordinates out of range: {}",
            drop.coordinate
        )));
    }
    Ok(())
}

// ============================================================================
// Postgres
// ============================================================================

/// Drops stored as JSONB documents in the `drops` table
#[derive(Clone)]
pub struct PgTargetStore {
    pool: DbPool,
}

impl PgTargetStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn row_document(row: &tokio_postgres::Row) -> StoreResult<Value> {
        let id: String = row.try_get("id")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let document: Value = row.try_get("document")?;
        Ok(keyed_document(id, created_at, document))
    }
}

/// A stored document keyed by its row: the row id always wins over any `id`
/// inside the document, the row timestamp fills in a missing `createdAt`.
fn keyed_document(id: String, created_at: DateTime<Utc>, mut document: Value) -> Value {
    if let Some(object) = document.as_object_mut() {
        object.insert("id".to_string(), Value::String(id));
        object
            .entry("createdAt")
            .or_insert_with(|| Value::String(created_at.to_rfc3339()));
    }
    document
}

#[async_trait]
impl TargetStore for PgTargetStore {
    async fn list_targets(&self) -> StoreResult<Vec<Target>> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                "SELECT id, document, created_at FROM drops ORDER BY created_at ASC",
                &[],
            )
            .await?;

        let documents = rows
            .iter()
            .map(Self::row_document)
            .collect::<StoreResult<Vec<_>>>()?;

        debug!("Fetched {} drop documents", documents.len());
        Ok(ingest_documents(documents))
    }

    async fn get_target(&self, id: &str) -> StoreResult<Option<Target>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, document, created_at FROM drops WHERE id = $1",
                &[&id],
            )
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let document = Self::row_document(&row)?;
        match parse_target(&document) {
            Ok(target) => Ok(Some(target)),
            Err(reason) => {
                warn!(drop_id = %id, "Stored drop is malformed: {}", reason);
                Ok(None)
            }
        }
    }

    async fn insert_drop(&self, drop: NewDrop) -> StoreResult<Target> {
        validate_drop(&drop)?;

        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let document = drop_document(&id, &drop, created_at);

        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO drops (id, document, created_at) VALUES ($1, $2, $3)",
                &[&id, &document, &created_at],
            )
            .await?;

        info!(drop_id = %id, "Drop stored at {}", drop.coordinate);
        parse_target(&document).map_err(|reason| StoreError::Serialization(reason.to_string()))
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Document store kept in process; used when no database is configured
#[derive(Default)]
pub struct InMemoryTargetStore {
    documents: RwLock<Vec<Value>>,
}

impl InMemoryTargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with raw documents; they go through the same ingestion as stored ones
    pub fn with_documents(documents: Vec<Value>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl TargetStore for InMemoryTargetStore {
    async fn list_targets(&self) -> StoreResult<Vec<Target>> {
        let documents = self.documents.read().await.clone();
        Ok(ingest_documents(documents))
    }

    async fn get_target(&self, id: &str) -> StoreResult<Option<Target>> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
            .find_map(|doc| parse_target(doc).ok()))
    }

    async fn insert_drop(&self, drop: NewDrop) -> StoreResult<Target> {
        validate_drop(&drop)?;

        let id = Uuid::new_v4().to_string();
        let document = drop_document(&id, &drop, Utc::now());
        let target =
            parse_target(&document).map_err(|reason| StoreError::Serialization(reason.to_string()))?;

        self.documents.write().await.push(document);
        info!(drop_id = %id, "Drop stored in memory at {}", drop.coordinate);
        Ok(target)
    }
}
