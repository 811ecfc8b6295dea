//! JSON API handlers.
//!
//! Every error response from these routes is `{"message": ...}`.

pub mod cart;
pub mod search;

use crate::error::AppError;

/// Fallback for API routes hit with an unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
