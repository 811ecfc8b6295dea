//! In-process object storage.

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::sync::RwLock;

use super::{ObjectStorage, StorageError, StoredObject};

#[derive(Debug, Clone)]
struct Blob {
    content_type: String,
    bytes: Bytes,
}

/// Object storage held in memory. URLs use the `memory://` scheme.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<BTreeMap<String, Blob>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of all stored objects, sorted.
    pub async fn paths(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Content type and size of a stored object.
    pub async fn metadata(&self, path: &str) -> Option<(String, usize)> {
        self.objects
            .read()
            .await
            .get(path)
            .map(|blob| (blob.content_type.clone(), blob.bytes.len()))
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredObject, StorageError> {
        self.objects.write().await.insert(
            path.to_string(),
            Blob {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(StoredObject {
            path: path.to_string(),
            url: format!("memory://{path}"),
        })
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(path);
        Ok(())
    }
}
