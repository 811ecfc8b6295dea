//! CLI command implementations.
//!
//! Each command takes a `&dyn DocumentStore` so it can be exercised against
//! the in-memory store in tests.

pub mod carts;
pub mod items;
pub mod seed;

use kirana_storefront::config::{ConfigError, FirebaseConfig};
use kirana_storefront::firebase::{FirebaseClient, FirebaseError, FirestoreStore};
use thiserror::Error;

/// Errors raised while connecting to the backend.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Firebase settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("Firebase client error: {0}")]
    Client(#[from] FirebaseError),
}

/// Build a Firestore client from the environment.
///
/// # Errors
///
/// Returns `ConnectError` if the Firebase settings are missing or invalid.
pub fn connect() -> Result<FirestoreStore, ConnectError> {
    dotenvy::dotenv().ok();
    let config = FirebaseConfig::from_env()?;
    tracing::info!(project_id = %config.project_id, "Connecting to Firestore");
    let client = FirebaseClient::new(&config)?;
    Ok(FirestoreStore::new(client))
}
