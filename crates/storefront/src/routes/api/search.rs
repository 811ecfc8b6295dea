//! `GET /api/search` and `GET /api/suggestions`.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use kirana_core::Item;

use crate::error::Result;
use crate::services::search::{Suggestion, search_items, suggest};
use crate::state::AppState;

/// Query parameters shared by both endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Items whose title or tags contain `q`, in catalog order.
///
/// `q` is trimmed first; a blank query returns an empty list.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Item>>> {
    if query.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    let items = state.catalog().list().await?;
    let matches = search_items(&items, &query.q).into_iter().cloned().collect();
    Ok(Json(matches))
}

/// Up to five title/tag completions for `q`.
#[instrument(skip(state))]
pub async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Suggestion>>> {
    if query.q.trim().chars().count() < crate::services::search::MIN_SUGGESTION_QUERY_CHARS {
        return Ok(Json(Vec::new()));
    }
    let items = state.catalog().list().await?;
    Ok(Json(suggest(&items, &query.q)))
}
