//! In-process document store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Collection, Document, DocumentStore, Fields, Revision, StoreError, document_path};

#[derive(Debug, Clone)]
struct Stored {
    fields: Fields,
    revision: u64,
}

impl Stored {
    fn to_document(&self, id: &str) -> Document {
        Document {
            id: id.to_owned(),
            fields: self.fields.clone(),
            revision: Revision::new(self.revision.to_string()),
        }
    }
}

/// Document store held in memory.
///
/// Revisions come from a store-wide counter, so a revision never repeats
/// even after a document is deleted and recreated.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Stored>>>,
    next_revision: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self) -> u64 {
        self.next_revision.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .map(|stored| stored.to_document(id)))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, stored)| stored.to_document(id))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::AlreadyExists(document_path(collection, id)));
        }
        let stored = Stored {
            fields,
            revision: self.bump(),
        };
        let document = stored.to_document(id);
        docs.insert(id.to_owned(), stored);
        Ok(document)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
        precondition: Option<&Revision>,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let stored = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(document_path(collection, id)))?;

        if let Some(expected) = precondition
            && expected.as_str() != stored.revision.to_string()
        {
            return Err(StoreError::Conflict(document_path(collection, id)));
        }

        stored.fields.extend(fields);
        stored.revision = self.bump();
        Ok(stored.to_document(id))
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(&collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
