//! Cart route handlers.
//!
//! The cart lives in the signed-in user's profile document. Form posts
//! redirect back to `/cart`; failures are reported through a flash message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use kirana_core::{CartTotals, ItemId, Quantity};

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAuth, set_flash, take_flash};
use crate::models::CurrentUser;
use crate::services::cart::CartEntry;
use crate::services::{CartAction, CartServiceError, CartView};
use crate::state::AppState;

const UPDATE_FAILED: &str = "Failed to update cart. Please try again.";
const REMOVE_FAILED: &str = "Failed to remove item from cart. Please try again.";

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub item_id: String,
    pub title: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub quantity: u32,
    pub line_total: Decimal,
}

impl From<&CartEntry> for CartLineView {
    fn from(entry: &CartEntry) -> Self {
        Self {
            item_id: entry.item.id.to_string(),
            title: entry.item.title.clone(),
            image: entry.item.primary_image().map(String::from),
            price: entry.item.price,
            original_price: entry.item.discount_percent().and(entry.item.original_price),
            quantity: entry.quantity.get(),
            line_total: entry.line_total(),
        }
    }
}

/// Update quantity form data.
///
/// The quantity stays a string so a blank or non-numeric entry reaches the
/// handler and is reported like any other failed update.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: String,
    #[serde(default)]
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub user: Option<CurrentUser>,
    pub lines: Vec<CartLineView>,
    pub totals: CartTotals,
    pub max_quantity: u32,
    pub flash: Option<String>,
}

/// Display cart page.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let view = match state.carts().view(&user.id).await {
        Ok(view) => view,
        // Signed in through a provider account whose profile was never written.
        Err(CartServiceError::UserNotFound(_)) => CartView::default(),
        Err(e) => return Err(e.into()),
    };

    Ok(CartShowTemplate {
        lines: view.entries.iter().map(CartLineView::from).collect(),
        totals: view.totals,
        max_quantity: Quantity::MAX,
        flash: take_flash(&session).await,
        user: Some(user),
    })
}

/// Set the quantity of a cart line.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Redirect {
    let quantity = form
        .quantity
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| Quantity::new(n).ok());
    let parsed = ItemId::parse(&form.item_id).ok().zip(quantity);
    let Some((item_id, quantity)) = parsed else {
        set_flash(&session, UPDATE_FAILED).await;
        return Redirect::to("/cart");
    };

    if let Err(e) = state
        .carts()
        .apply(&user.id, &item_id, CartAction::Update(quantity))
        .await
    {
        tracing::warn!(error = %e, "Cart update failed");
        set_flash(&session, UPDATE_FAILED).await;
    }
    Redirect::to("/cart")
}

/// Remove a cart line.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Redirect {
    let Ok(item_id) = ItemId::parse(&form.item_id) else {
        set_flash(&session, REMOVE_FAILED).await;
        return Redirect::to("/cart");
    };

    if let Err(e) = state
        .carts()
        .apply(&user.id, &item_id, CartAction::Remove)
        .await
    {
        tracing::warn!(error = %e, "Cart remove failed");
        set_flash(&session, REMOVE_FAILED).await;
    }
    Redirect::to("/cart")
}
