//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{FirebaseConfig, StorefrontConfig};
use crate::db::{DocumentStore, MemoryStore};
use crate::firebase::{
    FirebaseAuth, FirebaseClient, FirebaseError, FirebaseStorage, FirestoreStore,
};
use crate::services::{AuthProvider, CartService, CatalogService, MemoryAuthProvider};
use crate::storage::{MemoryStorage, ObjectStorage};

/// The three managed-backend collaborators.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub auth: Arc<dyn AuthProvider>,
}

impl Backends {
    /// Firestore, Firebase Storage and Firebase Auth over one HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn firebase(config: &FirebaseConfig, base_url: &str) -> Result<Self, FirebaseError> {
        let client = FirebaseClient::new(config)?;
        Ok(Self {
            store: Arc::new(FirestoreStore::new(client.clone())),
            storage: Arc::new(FirebaseStorage::new(client.clone())),
            auth: Arc::new(FirebaseAuth::new(client, base_url)),
        })
    }

    /// Empty in-memory backends.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::in_memory_with_auth(MemoryAuthProvider::new())
    }

    /// In-memory backends with a preconfigured auth provider (for seeding
    /// Google identities).
    #[must_use]
    pub fn in_memory_with_auth(auth: MemoryAuthProvider) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            storage: Arc::new(MemoryStorage::new()),
            auth: Arc::new(auth),
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backends, services and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backends: Backends,
    catalog: CatalogService,
    carts: CartService,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, backends: Backends) -> Self {
        let catalog = CatalogService::new(
            Arc::clone(&backends.store),
            Arc::clone(&backends.storage),
            config.catalog_cache_ttl,
        );
        let carts = CartService::new(Arc::clone(&backends.store));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backends,
                catalog,
                carts,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        &*self.inner.backends.store
    }

    /// The auth provider.
    #[must_use]
    pub fn auth_provider(&self) -> &dyn AuthProvider {
        &*self.inner.backends.auth
    }

    /// Catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Cart service.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }
}
