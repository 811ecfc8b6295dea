//! Catalog reads and admin item creation.
//!
//! The item list backs the home page, search and suggestions, so it is cached
//! with `moka` and invalidated whenever an item is created through this
//! service. Item detail reads go straight to the store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use chrono::Utc;
use moka::future::Cache;
use thiserror::Error;
use tracing::instrument;

use kirana_core::{Item, ItemError, ItemId, NewItem};

use crate::db::{DocumentStore, ItemRepository, StoreError};
use crate::storage::{ObjectStorage, StorageError, StoredObject, product_image_path};

const ITEMS_KEY: &str = "items";

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The submitted item failed validation.
    #[error("invalid item: {0}")]
    Invalid(#[from] ItemError),

    /// An item with this ID already exists.
    #[error("item {0} already exists")]
    AlreadyExists(ItemId),

    /// Two submitted images resolve to the same storage path.
    #[error("duplicate image name: {0}")]
    DuplicateImage(String),

    /// Document store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Image upload failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// An image file submitted with a new item.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Catalog service.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn ObjectStorage>,
    cache: Cache<&'static str, Arc<Vec<Item>>>,
}

impl CatalogService {
    /// Create a catalog service whose item list is cached for `ttl`.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn ObjectStorage>,
        ttl: Duration,
    ) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self {
            store,
            storage,
            cache,
        }
    }

    /// All items in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the items cannot be listed.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Arc<Vec<Item>>, CatalogError> {
        if let Some(items) = self.cache.get(ITEMS_KEY).await {
            tracing::debug!("Cache hit for item list");
            return Ok(items);
        }

        let items = Arc::new(ItemRepository::new(&*self.store).list().await?);
        self.cache.insert(ITEMS_KEY, Arc::clone(&items)).await;
        Ok(items)
    }

    /// One item by ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` on backend failure or a malformed document.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn get(&self, id: &ItemId) -> Result<Option<Item>, CatalogError> {
        Ok(ItemRepository::new(&*self.store).get(id).await?)
    }

    /// Validate, upload images one at a time, then write the item document.
    ///
    /// If an upload or the document write fails, images uploaded so far are
    /// deleted before the error is returned. Cleanup failures are logged.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` for bad input, `CatalogError::DuplicateImage`
    /// when two images share a file name, `CatalogError::AlreadyExists` if the ID
    /// is taken, or the upload/store failure.
    #[instrument(skip(self, item, images), fields(item_id = %item.id, images = images.len()))]
    pub async fn create(
        &self,
        item: NewItem,
        images: Vec<ImageUpload>,
    ) -> Result<Item, CatalogError> {
        let item = item.validate()?;
        let items = ItemRepository::new(&*self.store);

        let mut paths: Vec<String> = Vec::with_capacity(images.len());
        for image in &images {
            let path = product_image_path(&item.id, &image.file_name)?;
            if paths.contains(&path) {
                return Err(CatalogError::DuplicateImage(image.file_name.clone()));
            }
            paths.push(path);
        }

        if items.get(&item.id).await?.is_some() {
            return Err(CatalogError::AlreadyExists(item.id));
        }

        let mut uploaded: Vec<StoredObject> = Vec::with_capacity(images.len());
        for (image, path) in images.into_iter().zip(&paths) {
            let result = self
                .storage
                .upload(path, &image.content_type, image.bytes)
                .await;
            match result {
                Ok(object) => uploaded.push(object),
                Err(e) => {
                    tracing::warn!(error = %e, file = %image.file_name, "Image upload failed");
                    self.cleanup(&uploaded).await;
                    return Err(e.into());
                }
            }
        }

        let urls = uploaded.iter().map(|o| o.url.clone()).collect();
        let item = item.into_item(urls, Utc::now());

        match items.create(&item).await {
            Ok(()) => {}
            // Another admin created the same ID meanwhile. This request's uploads
            // have already overwritten that item's images at the same paths, so
            // deleting them would break the other item.
            Err(StoreError::AlreadyExists(_)) => {
                return Err(CatalogError::AlreadyExists(item.id));
            }
            Err(e) => {
                self.cleanup(&uploaded).await;
                return Err(e.into());
            }
        }

        self.cache.invalidate(ITEMS_KEY).await;
        tracing::info!("Item created");
        Ok(item)
    }

    /// Best-effort deletion of uploaded images.
    async fn cleanup(&self, uploaded: &[StoredObject]) {
        for object in uploaded {
            if let Err(e) = self.storage.delete(&object.path).await {
                tracing::error!(error = %e, path = %object.path, "Failed to delete orphaned image");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::db::{Collection, MemoryStore};
    use crate::firebase::FirebaseError;
    use crate::storage::MemoryStorage;

    /// Storage that fails the upload with the given index (0-based).
    struct FailingStorage {
        inner: MemoryStorage,
        fail_at: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStorage for FailingStorage {
        async fn upload(
            &self,
            path: &str,
            content_type: &str,
            bytes: Bytes,
        ) -> Result<StoredObject, StorageError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_at {
                return Err(StorageError::Backend(FirebaseError::RateLimited(1)));
            }
            self.inner.upload(path, content_type, bytes).await
        }

        async fn delete(&self, path: &str) -> Result<(), StorageError> {
            self.inner.delete(path).await
        }
    }

    fn new_item(id: &str) -> NewItem {
        NewItem {
            id: ItemId::parse(id).unwrap(),
            title: "Cotton Kurta".to_string(),
            price: Decimal::new(799, 0),
            original_price: Some(Decimal::new(999, 0)),
            tagline: String::new(),
            product_details: String::new(),
            delivery: String::new(),
            color: vec![],
            size: vec![],
            tags: vec!["ethnic".to_string()],
        }
    }

    fn image(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: Bytes::from_static(b"jpeg"),
        }
    }

    #[tokio::test]
    async fn test_create_uploads_images_in_order() {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(MemoryStorage::new());
        let catalog = CatalogService::new(store.clone(), storage.clone(), Duration::from_secs(60));

        let item = catalog
            .create(new_item("kurta-01"), vec![image("front.jpg"), image("back.jpg")])
            .await
            .unwrap();

        assert_eq!(
            item.images,
            vec![
                "memory://products/kurta-01/front.jpg",
                "memory://products/kurta-01/back.jpg"
            ]
        );
        assert!(item.created_at.is_some());
        let doc = store.get(Collection::Items, "kurta-01").await.unwrap().unwrap();
        assert_eq!(doc.fields["itemId"], "kurta-01");
        assert_eq!(doc.fields["tags"], json!(["ethnic"]));
    }

    #[tokio::test]
    async fn test_create_rejects_existing_id() {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(MemoryStorage::new());
        let catalog = CatalogService::new(store, storage.clone(), Duration::from_secs(60));

        catalog.create(new_item("kurta-01"), vec![]).await.unwrap();
        let err = catalog
            .create(new_item("kurta-01"), vec![image("x.jpg")])
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::AlreadyExists(_)));
        assert!(storage.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_upload_removes_earlier_images() {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(FailingStorage {
            inner: MemoryStorage::new(),
            fail_at: 2,
            calls: AtomicUsize::new(0),
        });
        let catalog = CatalogService::new(store.clone(), storage.clone(), Duration::from_secs(60));

        let err = catalog
            .create(
                new_item("kurta-01"),
                vec![image("1.jpg"), image("2.jpg"), image("3.jpg")],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Storage(_)));
        assert!(storage.inner.paths().await.is_empty());
        assert!(store.get(Collection::Items, "kurta-01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_item_uploads_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let catalog = CatalogService::new(
            Arc::new(MemoryStore::new()),
            storage.clone(),
            Duration::from_secs(60),
        );
        let mut item = new_item("kurta-01");
        item.title = "  ".to_string();

        let err = catalog.create(item, vec![image("a.jpg")]).await.unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(ItemError::EmptyTitle)));
        assert!(storage.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_image_names_upload_nothing() {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(MemoryStorage::new());
        let catalog = CatalogService::new(store.clone(), storage.clone(), Duration::from_secs(60));

        let err = catalog
            .create(
                new_item("kurta-01"),
                vec![image("image.jpg"), image("front.jpg"), image("uploads/image.jpg")],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::DuplicateImage(ref name) if name == "uploads/image.jpg"));
        assert!(storage.paths().await.is_empty());
        assert!(store.get(Collection::Items, "kurta-01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_cache_invalidated_on_create() {
        let store = Arc::new(MemoryStore::new());
        let catalog = CatalogService::new(
            store,
            Arc::new(MemoryStorage::new()),
            Duration::from_secs(60),
        );

        assert!(catalog.list().await.unwrap().is_empty());
        catalog.create(new_item("kurta-01"), vec![]).await.unwrap();

        let items = catalog.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Cotton Kurta");
    }
}
