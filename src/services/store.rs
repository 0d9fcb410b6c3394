use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur at the document-store boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Version conflict on {collection}/{id}: expected {expected}, found {found:?}")]
    Conflict {
        collection: String,
        id: String,
        expected: u64,
        found: Option<u64>,
    },

    #[error("Corrupt document: {0}")]
    Corrupt(String),
}

/// Expected version for a document that must not exist yet
pub const NEW_DOCUMENT: u64 = 0;

/// A stored JSON document and the version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
    pub version: u64,
}

/// Document store holding profiles and questionnaires.
///
/// Collections are plain names (`apartments`, `roommates`, `questionnaires`).
/// Every write is conditional on the version the caller read, so concurrent
/// writers to the same document cannot silently overwrite each other.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a single document, `None` if it does not exist
    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Fetch every document of a collection in insertion order
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Write `body` if the stored version still equals `expected_version`
    /// ([`NEW_DOCUMENT`] to insert). Returns the new version.
    async fn save(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        expected_version: u64,
    ) -> Result<u64, StoreError>;

    /// Delete a document if its stored version still equals `expected_version`.
    /// Returns `false` when there was nothing to delete.
    async fn remove(&self, collection: &str, id: &str, expected_version: u64) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[derive(Debug, Default)]
struct Collection {
    /// Insertion sequence number to (id, version, body)
    documents: BTreeMap<u64, (String, u64, Value)>,
    index: HashMap<String, u64>,
    next_seq: u64,
}

/// In-process store, used in tests and when no database is configured
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        let document = collections.get(collection).and_then(|c| {
            let seq = c.index.get(id)?;
            c.documents.get(seq).map(|(id, version, body)| Document {
                id: id.clone(),
                body: body.clone(),
                version: *version,
            })
        });
        Ok(document)
    }

    async fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let documents = collections
            .get(collection)
            .map(|c| {
                c.documents
                    .values()
                    .map(|(id, version, body)| Document {
                        id: id.clone(),
                        body: body.clone(),
                        version: *version,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(documents)
    }

    async fn save(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let c = collections.entry(collection.to_string()).or_default();

        let conflict = |found: Option<u64>| StoreError::Conflict {
            collection: collection.to_string(),
            id: id.to_string(),
            expected: expected_version,
            found,
        };

        match c.index.get(id).copied() {
            Some(seq) => {
                let Some(entry) = c.documents.get_mut(&seq) else {
                    return Err(StoreError::Corrupt(format!("{collection}/{id}: dangling index entry")));
                };
                if entry.1 != expected_version {
                    return Err(conflict(Some(entry.1)));
                }
                entry.1 += 1;
                entry.2 = body;
                tracing::trace!("Updated {}/{} to version {}", collection, id, entry.1);
                Ok(entry.1)
            }
            None if expected_version == NEW_DOCUMENT => {
                let seq = c.next_seq;
                c.next_seq += 1;
                c.index.insert(id.to_string(), seq);
                c.documents.insert(seq, (id.to_string(), 1, body));
                tracing::trace!("Inserted {}/{}", collection, id);
                Ok(1)
            }
            None => Err(conflict(None)),
        }
    }

    async fn remove(&self, collection: &str, id: &str, expected_version: u64) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(c) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(seq) = c.index.get(id).copied() else {
            return Ok(false);
        };

        let found = c.documents.get(&seq).map(|entry| entry.1);
        if found != Some(expected_version) {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                id: id.to_string(),
                expected: expected_version,
                found,
            });
        }

        c.index.remove(id);
        c.documents.remove(&seq);
        tracing::trace!("Removed {}/{}", collection, id);
        Ok(true)
    }
}
