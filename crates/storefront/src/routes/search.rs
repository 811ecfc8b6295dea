//! Search results page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::routes::api::search::SearchQuery;
use crate::routes::home::ItemCard;
use crate::services::search::search_items;
use crate::state::AppState;

/// Search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchPageTemplate {
    pub user: Option<CurrentUser>,
    pub query: String,
    pub results: Vec<ItemCard>,
}

/// Display search results for `q`.
#[instrument(skip(state, user))]
pub async fn search_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let q = query.q.trim().to_string();
    let results = if q.is_empty() {
        Vec::new()
    } else {
        let items = state.catalog().list().await?;
        search_items(&items, &q)
            .into_iter()
            .map(ItemCard::from)
            .collect()
    };

    Ok(SearchPageTemplate {
        user,
        query: q,
        results,
    })
}
