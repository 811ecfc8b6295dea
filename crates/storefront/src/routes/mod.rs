//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Item listing
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (document store reachable)
//!
//! # Items
//! GET  /items/{id}             - Item detail
//! POST /items/{id}/add-to-cart - Add one unit, redirect to cart
//!
//! # Cart (requires auth)
//! GET  /cart                   - Cart page with totals
//! POST /cart/update            - Set line quantity
//! POST /cart/remove            - Remove line
//!
//! # Search
//! GET  /search?q=              - Search results page
//!
//! # Admin (requires admin email)
//! GET  /admin/items/new        - New item form
//! POST /admin/items/new        - Create item (multipart, with images)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Email/password login
//! GET  /auth/signup            - Signup page
//! POST /auth/signup            - Email/password signup
//! POST /auth/google            - Google Identity Services callback
//! POST /auth/logout            - Logout
//!
//! # JSON API
//! POST /api/cart               - Cart mutation
//! GET  /api/search?q=          - Matching items
//! GET  /api/suggestions?q=     - Up to 5 title/tag suggestions
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod health;
pub mod home;
pub mod items;
pub mod search;

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Largest admin form accepted, images included.
const ADMIN_FORM_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/google", post(auth::google))
        .route("/logout", post(auth::logout))
}

/// Create the item routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(items::show))
        .route("/{id}/add-to-cart", post(items::add_to_cart))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/items/new",
            get(admin::new_item_page).post(admin::create_item),
        )
        .layer(DefaultBodyLimit::max(ADMIN_FORM_LIMIT_BYTES))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cart",
            post(api::cart::mutate).fallback(api::method_not_allowed),
        )
        .route(
            "/search",
            get(api::search::search).fallback(api::method_not_allowed),
        )
        .route(
            "/suggestions",
            get(api::search::suggestions).fallback(api::method_not_allowed),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/search", get(search::search_page))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/items", item_routes())
        .nest("/cart", cart_routes())
        .nest("/admin", admin_routes())
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
}

/// The storefront with its middleware stack, ready to serve.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes()
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
