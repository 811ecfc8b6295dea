//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; the response body is always `{"message": ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::services::auth::AuthError;
use crate::services::cart::CartServiceError;
use crate::services::catalog::CatalogError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartServiceError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Object storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Signed in as someone not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Route exists, method does not.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

const INTERNAL_MESSAGE: &str = "Internal server error";

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::AlreadyExists(_) | StoreError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(err) | Self::Catalog(CatalogError::Store(err)) => store_status(err),
            Self::Catalog(err) => match err {
                CatalogError::Invalid(_) | CatalogError::DuplicateImage(_) => {
                    StatusCode::BAD_REQUEST
                }
                CatalogError::AlreadyExists(_) => StatusCode::CONFLICT,
                CatalogError::Store(_) | CatalogError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(err) => match err {
                CartServiceError::UserNotFound(_)
                | CartServiceError::ItemNotFound(_)
                | CartServiceError::NotInCart(_) => StatusCode::NOT_FOUND,
                CartServiceError::Conflict(_) => StatusCode::CONFLICT,
                CartServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => Self::status_for_auth(err),
            Self::Storage(StorageError::InvalidFileName(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// HTTP status for an authentication failure, also used when the login
    /// and signup forms are re-rendered.
    #[must_use]
    pub const fn status_for_auth(err: &AuthError) -> StatusCode {
        match err {
            AuthError::InvalidUid(_)
            | AuthError::Repository(_)
            | AuthError::Provider(_)
            | AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InvalidCredentials | AuthError::InvalidGoogleCredential => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::UserDisabled => StatusCode::FORBIDDEN,
            AuthError::EmailExists => StatusCode::CONFLICT,
            AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) | AuthError::MissingName => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    /// Message safe to return to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.status().is_server_error() {
            return INTERNAL_MESSAGE.to_string();
        }
        match self {
            Self::Cart(err) => match err {
                CartServiceError::UserNotFound(_) => "User not found".to_string(),
                CartServiceError::ItemNotFound(_) => "Item not found".to_string(),
                CartServiceError::NotInCart(_) => "Item not found in cart".to_string(),
                CartServiceError::Conflict(_) => {
                    "Cart was modified concurrently, please try again".to_string()
                }
                CartServiceError::Store(_) => INTERNAL_MESSAGE.to_string(),
            },
            Self::Catalog(err) => match err {
                CatalogError::Invalid(e) => e.to_string(),
                CatalogError::AlreadyExists(id) => {
                    format!("An item with ID {id} already exists")
                }
                CatalogError::DuplicateImage(name) => {
                    format!("More than one image is named {name}; rename one and try again")
                }
                _ => INTERNAL_MESSAGE.to_string(),
            },
            Self::Auth(err) => err.user_message(),
            Self::Store(StoreError::NotFound(_)) => "Not found".to_string(),
            Self::Store(StoreError::AlreadyExists(_)) => "Already exists".to_string(),
            Self::Store(_) => "Resource was modified concurrently".to_string(),
            Self::Storage(err) => err.to_string(),
            Self::NotFound(msg) | Self::Forbidden(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::MethodNotAllowed => "Method not allowed".to_string(),
            Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        let body = ErrorBody {
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kirana_core::{CartError, ItemId, UserId};

    use super::*;
    use crate::firebase::FirebaseError;

    fn item_id() -> ItemId {
        ItemId::parse("sku1").unwrap()
    }

    #[test]
    fn test_cart_error_statuses() {
        let uid = UserId::parse("u1").unwrap();
        let cases = [
            (
                CartServiceError::UserNotFound(uid.clone()),
                StatusCode::NOT_FOUND,
            ),
            (
                CartServiceError::ItemNotFound(item_id()),
                StatusCode::NOT_FOUND,
            ),
            (
                CartServiceError::NotInCart(CartError::NotInCart(item_id())),
                StatusCode::NOT_FOUND,
            ),
            (CartServiceError::Conflict(uid), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Store(StoreError::Backend(FirebaseError::Api {
            status: 503,
            code: "UNAVAILABLE".to_string(),
            message: "projects/kirana-prod is unavailable".to_string(),
        }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_auth_error_messages() {
        let err = AppError::Auth(AuthError::EmailExists);
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(
            err.public_message(),
            "An account with this email already exists"
        );
    }

    #[test]
    fn test_simple_variants() {
        assert_eq!(
            AppError::BadRequest("Invalid action".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AppError::Catalog(CatalogError::AlreadyExists(item_id())).status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_response_body_is_json_message() {
        let response = AppError::NotFound("Item not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"message": "Item not found"}));
    }
}
