//! Item repository.
//!
//! Items are stored at `items/{itemId}`. The admin-entered ID is also written
//! into the document as `itemId` so documents stay self-describing when
//! exported.

use kirana_core::{Item, ItemId};
use serde_json::Value;

use super::{Collection, DocumentStore, StoreError, from_document, to_fields};

/// Repository for catalog items.
pub struct ItemRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Every decodable item in store order.
    ///
    /// Documents that do not match the item schema are logged and skipped so
    /// one bad record cannot take down listing or search.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the collection cannot be listed.
    pub async fn list(&self) -> Result<Vec<Item>, StoreError> {
        let documents = self.store.list(Collection::Items).await?;
        Ok(documents
            .into_iter()
            .filter_map(|document| match from_document(Collection::Items, document) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed item document");
                    None
                }
            })
            .collect())
    }

    /// Get an item by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Decode` if the document is malformed, or a backend error.
    pub async fn get(&self, id: &ItemId) -> Result<Option<Item>, StoreError> {
        self.store
            .get(Collection::Items, id.as_str())
            .await?
            .map(|document| from_document(Collection::Items, document))
            .transpose()
    }

    /// Create an item document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the ID is taken.
    pub async fn create(&self, item: &Item) -> Result<(), StoreError> {
        let mut fields = to_fields(item)?;
        fields.insert(
            "itemId".to_owned(),
            Value::String(item.id.as_str().to_owned()),
        );
        self.store
            .create(Collection::Items, item.id.as_str(), fields)
            .await?;
        Ok(())
    }
}
