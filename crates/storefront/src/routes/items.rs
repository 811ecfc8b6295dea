//! Item detail route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use kirana_core::{Item, ItemId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, set_flash, take_flash};
use crate::models::CurrentUser;
use crate::services::CartAction;
use crate::state::AppState;

/// Shown when adding to the cart fails for any reason.
pub const ADD_TO_CART_FAILED: &str = "Failed to add item to cart. Please try again.";

/// Shown when an item comes in sizes and none of them was picked.
pub const SELECT_SIZE: &str = "Please select a size";

/// Add to cart form data.
#[derive(Debug, Default, Deserialize)]
pub struct AddToCartForm {
    #[serde(default)]
    pub size: Option<String>,
}

/// Item detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "items/show.html")]
pub struct ItemShowTemplate {
    pub user: Option<CurrentUser>,
    pub item: Item,
    pub discount_percent: Option<u32>,
    pub flash: Option<String>,
}

fn parse_item_id(raw: &str) -> Result<ItemId> {
    ItemId::parse(raw).map_err(|_| AppError::NotFound("Item not found".to_string()))
}

/// Display an item.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_item_id(&id)?;
    let item = state
        .catalog()
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

    Ok(ItemShowTemplate {
        user,
        discount_percent: item.discount_percent(),
        item,
        flash: take_flash(&session).await,
    })
}

/// Whether the submitted size is acceptable for the item.
fn size_selected(item: &Item, size: Option<&str>) -> bool {
    item.size.is_empty() || size.is_some_and(|s| item.size.iter().any(|known| known == s))
}

/// Add one unit of the item to the signed-in user's cart.
///
/// Items that come in sizes need one picked first. Redirects to the cart on
/// success, or back to the item with a message.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    form: std::result::Result<Form<AddToCartForm>, FormRejection>,
) -> Response {
    let back = format!("/items/{}", urlencoding::encode(&id));
    let Ok(item_id) = ItemId::parse(&id) else {
        set_flash(&session, ADD_TO_CART_FAILED).await;
        return Redirect::to(&back).into_response();
    };
    let form = form.map(|Form(form)| form).unwrap_or_default();

    match state.catalog().get(&item_id).await {
        Ok(Some(item)) if !size_selected(&item, form.size.as_deref()) => {
            set_flash(&session, SELECT_SIZE).await;
            return Redirect::to(&back).into_response();
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Item lookup failed");
            set_flash(&session, ADD_TO_CART_FAILED).await;
            return Redirect::to(&back).into_response();
        }
    }

    match state
        .carts()
        .apply(&user.id, &item_id, CartAction::Add)
        .await
    {
        Ok(_) => {
            add_breadcrumb("cart", "Added item to cart", Some(&[("item_id", id.as_str())][..]));
            Redirect::to("/cart").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Add to cart failed");
            set_flash(&session, ADD_TO_CART_FAILED).await;
            Redirect::to(&back).into_response()
        }
    }
}
