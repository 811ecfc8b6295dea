//! Object storage for product images.
//!
//! Images are stored at `products/{itemId}/{filename}`; the filename is
//! reduced to its last path component so uploads cannot escape the item's
//! folder.

pub mod memory;

use async_trait::async_trait;
use axum::body::Bytes;
use kirana_core::ItemId;
use thiserror::Error;

use crate::firebase::FirebaseError;

pub use memory::MemoryStorage;

/// An uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object path inside the bucket.
    pub path: String,
    /// Public download URL.
    pub url: String,
}

/// Errors that can occur in object storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The file name has no usable final component.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    /// The backend accepted the upload but returned no usable object metadata.
    #[error("unexpected upload response: {0}")]
    UnexpectedResponse(String),

    /// Backend request failed.
    #[error("backend error: {0}")]
    Backend(#[from] FirebaseError),
}

/// Blob store with public download URLs.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path`, replacing any existing object.
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredObject, StorageError>;

    /// Delete the object at `path`. Deleting a missing object succeeds.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}

/// Storage path for an item image.
///
/// # Errors
///
/// Returns `StorageError::InvalidFileName` when nothing usable remains after
/// stripping directories (empty names, `.` and `..`).
pub fn product_image_path(item_id: &ItemId, file_name: &str) -> Result<String, StorageError> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(StorageError::InvalidFileName(file_name.to_string()));
    }
    Ok(format!("products/{item_id}/{base}"))
}
