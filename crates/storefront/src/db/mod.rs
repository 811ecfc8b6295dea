//! Document store access for the storefront.
//!
//! # Collections
//!
//! - `users/{uid}` - Profile (`name`, `email`, `createdAt`) with the embedded `cart` array
//! - `items/{itemId}` - Product records written by the admin form
//!
//! The store itself is a collaborator behind [`DocumentStore`]: Firestore in
//! production ([`crate::firebase::FirestoreStore`]) and [`MemoryStore`] for
//! tests and local development. Typed access goes through
//! [`UserRepository`] and [`ItemRepository`].

pub mod items;
pub mod memory;
pub mod users;

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::firebase::FirebaseError;

pub use items::ItemRepository;
pub use memory::MemoryStore;
pub use users::UserRepository;

/// Document fields as a JSON object.
pub type Fields = Map<String, Value>;

/// Top-level collections used by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Items,
}

impl Collection {
    /// Collection name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Items => "items",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque document version used for conditional writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    /// Wrap a backend revision marker (an update time or a counter).
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw marker.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
    pub revision: Revision,
}

/// A decoded value together with the revision it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub revision: Revision,
}

/// Errors that can occur in document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Document already exists (create only).
    #[error("document already exists: {0}")]
    AlreadyExists(String),

    /// Revision precondition failed.
    #[error("document was modified concurrently: {0}")]
    Conflict(String),

    /// Stored fields do not match the expected schema.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be encoded as document fields.
    #[error("failed to encode document: {0}")]
    Encode(String),

    /// Backend request failed.
    #[error("backend error: {0}")]
    Backend(#[from] FirebaseError),
}

/// Minimal document database used by the storefront.
///
/// Implementations must treat `update` as a field merge: fields absent from
/// the update are left untouched.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, `None` if it does not exist.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// All documents in a collection, ordered by ID.
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    /// Create a document, failing with [`StoreError::AlreadyExists`] if the ID is taken.
    async fn create(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError>;

    /// Merge `fields` into an existing document.
    ///
    /// With a precondition the write only happens if the document is still at
    /// that revision; otherwise [`StoreError::Conflict`] is returned.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
        precondition: Option<&Revision>,
    ) -> Result<Document, StoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Path of a document, used in error messages and logs.
pub(crate) fn document_path(collection: Collection, id: &str) -> String {
    format!("{collection}/{id}")
}

/// Encode a serializable value as document fields.
///
/// `id` is dropped: it lives in the document name, not in the fields.
pub(crate) fn to_fields<T: serde::Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("id");
            Ok(fields)
        }
        Ok(other) => Err(StoreError::Encode(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(StoreError::Encode(e.to_string())),
    }
}

/// Decode a document into a typed value, injecting the document ID as `id`.
pub(crate) fn from_document<T: serde::de::DeserializeOwned>(
    collection: Collection,
    document: Document,
) -> Result<T, StoreError> {
    let path = document_path(collection, &document.id);
    let mut fields = document.fields;
    fields.insert("id".to_owned(), Value::String(document.id));
    serde_json::from_value(Value::Object(fields))
        .map_err(|source| StoreError::Decode { path, source })
}
