//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use tracing::instrument;

use kirana_core::Item;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Item card display data for listing templates.
#[derive(Clone)]
pub struct ItemCard {
    pub id: String,
    pub title: String,
    pub tagline: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub discount_percent: Option<u32>,
    pub image: Option<String>,
}

impl From<&Item> for ItemCard {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.to_string(),
            title: item.title.clone(),
            tagline: item.tagline.clone(),
            price: item.price,
            original_price: item.discount_percent().and(item.original_price),
            discount_percent: item.discount_percent(),
            image: item.primary_image().map(String::from),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: Option<CurrentUser>,
    pub items: Vec<ItemCard>,
}

/// Display the item listing.
#[instrument(skip(state, user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let items = state.catalog().list().await?;
    Ok(HomeTemplate {
        user,
        items: items.iter().map(ItemCard::from).collect(),
    })
}
