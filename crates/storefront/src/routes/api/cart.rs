//! `POST /api/cart` - cart mutation endpoint.
//!
//! Body: `{"userId", "itemId", "quantity"?, "action": "add" | "remove" | "update"}`.
//! Responds with `{"message", "cart"}` where `cart` is the list of
//! `{itemId, quantity}` lines as written.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use kirana_core::{Cart, ItemId, Quantity, UserId};

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::services::CartAction;
use crate::state::AppState;

/// Request body. Every field is optional so that missing fields produce a
/// 400 with a useful message instead of a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRequest {
    pub user_id: Option<String>,
    pub item_id: Option<String>,
    pub quantity: Option<i64>,
    pub action: Option<String>,
}

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub message: &'static str,
    pub cart: Cart,
}

/// A validated cart request.
#[derive(Debug, PartialEq, Eq)]
pub struct CartCommand {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub action: CartAction,
}

fn bad_request(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

impl CartRequest {
    /// Check required fields and parse them.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` describing the first problem found.
    pub fn validate(self) -> Result<CartCommand> {
        let (Some(user_id), Some(item_id), Some(action)) = (
            self.user_id.filter(|s| !s.trim().is_empty()),
            self.item_id.filter(|s| !s.trim().is_empty()),
            self.action,
        ) else {
            return Err(bad_request("userId, itemId and action are required"));
        };

        let user_id = UserId::parse(user_id.trim()).map_err(|_| bad_request("Invalid userId"))?;
        let item_id = ItemId::parse(item_id.trim()).map_err(|_| bad_request("Invalid itemId"))?;

        let action = match action.as_str() {
            "add" => CartAction::Add,
            "remove" => CartAction::Remove,
            "update" => {
                let quantity = self
                    .quantity
                    .ok_or_else(|| bad_request("quantity is required for update"))?;
                let quantity = Quantity::new(quantity).map_err(|_| {
                    AppError::BadRequest(format!(
                        "quantity must be between 1 and {}",
                        Quantity::MAX
                    ))
                })?;
                CartAction::Update(quantity)
            }
            _ => return Err(bad_request("Invalid action")),
        };

        Ok(CartCommand {
            user_id,
            item_id,
            action,
        })
    }
}

/// Apply a cart mutation.
///
/// Anonymous callers may name any user; a signed-in session may only modify
/// its own cart.
#[instrument(skip(state, current, payload))]
pub async fn mutate(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
    payload: std::result::Result<Json<CartRequest>, JsonRejection>,
) -> Result<Json<CartResponse>> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected cart request body");
        bad_request("Invalid request body")
    })?;
    let command = request.validate()?;

    if let Some(user) = &current
        && user.id != command.user_id
    {
        return Err(AppError::Forbidden(
            "Cannot modify another user's cart".to_string(),
        ));
    }

    let cart = state
        .carts()
        .apply(&command.user_id, &command.item_id, command.action)
        .await?;

    Ok(Json(CartResponse {
        message: command.action.success_message(),
        cart,
    }))
}
