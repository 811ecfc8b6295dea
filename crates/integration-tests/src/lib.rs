//! Integration tests for Kirana.
//!
//! Each test starts the real storefront router on an ephemeral port with
//! in-memory backends and talks to it over HTTP with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kirana-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_cart` - `POST /api/cart` contract
//! - `api_search` - search and suggestion endpoints
//! - `pages` - listing, item, cart and search pages
//! - `auth` - signup, login, Google sign-in and logout
//! - `admin` - the admin item form
//! - `health` - liveness and readiness

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use chrono::Utc;
use reqwest::{Client, redirect};
use serde_json::{Value, json};

use kirana_core::{Email, Item, UserId, UserProfile};
use kirana_storefront::config::StorefrontConfig;
use kirana_storefront::db::{Collection, DocumentStore, ItemRepository, UserRepository};
use kirana_storefront::routes;
use kirana_storefront::services::MemoryAuthProvider;
use kirana_storefront::state::{AppState, Backends};

/// Email allowed to use the admin item form in every test app.
pub const ADMIN_EMAIL: &str = "admin@kirana.shop";

/// A running storefront.
pub struct TestApp {
    pub base_url: String,
    pub store: Arc<dyn DocumentStore>,
}

impl TestApp {
    /// Start a storefront with empty in-memory backends.
    pub async fn spawn() -> Self {
        Self::spawn_with_auth(MemoryAuthProvider::new()).await
    }

    /// Start a storefront with a preconfigured auth provider.
    pub async fn spawn_with_auth(auth: MemoryAuthProvider) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let config = StorefrontConfig::in_memory(
            base_url.clone(),
            vec![Email::parse(ADMIN_EMAIL).unwrap()],
        );
        let backends = Backends::in_memory_with_auth(auth);
        let store = Arc::clone(&backends.store);
        let app = routes::app(AppState::new(config, backends));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, store }
    }

    /// Absolute URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A client with its own cookie jar that does not follow redirects.
    #[must_use]
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .unwrap()
    }

    /// Write an item straight into the store.
    pub async fn seed_item(&self, id: &str, title: &str, price: u32, tags: &[&str]) -> Item {
        self.seed_item_json(json!({
            "id": id,
            "title": title,
            "price": price,
            "tags": tags,
        }))
        .await
    }

    /// Write an item from its document shape (plus `id`).
    pub async fn seed_item_json(&self, value: Value) -> Item {
        let item: Item = serde_json::from_value(value).unwrap();
        ItemRepository::new(&*self.store).create(&item).await.unwrap();
        item
    }

    /// Create a profile with an empty cart, bypassing the auth provider.
    pub async fn seed_user(&self, uid: &str, email: &str) -> UserId {
        let id = UserId::parse(uid).unwrap();
        let profile = UserProfile::new(
            id.clone(),
            Email::parse(email).unwrap(),
            Some("Test Shopper".to_string()),
            Utc::now(),
        );
        UserRepository::new(&*self.store).create(&profile).await.unwrap();
        id
    }

    /// Find the profile ID created for an email.
    pub async fn user_id_for(&self, email: &str) -> String {
        self.store
            .list(Collection::Users)
            .await
            .unwrap()
            .into_iter()
            .find(|doc| doc.fields.get("email").and_then(Value::as_str) == Some(email))
            .map(|doc| doc.id)
            .unwrap()
    }

    /// The stored cart of a user as JSON.
    pub async fn stored_cart(&self, uid: &str) -> Value {
        let doc = self
            .store
            .get(Collection::Users, uid)
            .await
            .unwrap()
            .unwrap();
        doc.fields["cart"].clone()
    }

    /// Sign up through the form; the client keeps the session cookie.
    pub async fn sign_up(&self, client: &Client, name: &str, email: &str) {
        let resp = client
            .post(self.url("/auth/signup"))
            .form(&[("name", name), ("email", email), ("password", "secret123")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/");
    }

    /// `POST /api/cart` with a JSON body; returns status and body.
    pub async fn post_cart(&self, client: &Client, body: Value) -> (reqwest::StatusCode, Value) {
        let resp = client
            .post(self.url("/api/cart"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}
