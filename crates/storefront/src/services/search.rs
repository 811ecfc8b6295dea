//! Item search and query suggestions.
//!
//! Both work on the full item list: case-insensitive substring matching on
//! the title and tags, in catalog order. There is no index and no ranking.

use serde::Serialize;

use kirana_core::Item;

/// Most suggestions returned for one query.
pub const MAX_SUGGESTIONS: usize = 5;

/// Shortest (trimmed) query that produces suggestions.
pub const MIN_SUGGESTION_QUERY_CHARS: usize = 2;

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Title,
    Tag,
}

/// A completion for the search box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub value: String,
}

/// Surrounding whitespace is not part of the query, so `"kurta "` matches like
/// `"kurta"`; a blank query yields `None` and matches nothing.
fn normalize(query: &str) -> Option<String> {
    let query = query.trim();
    (!query.is_empty()).then(|| query.to_lowercase())
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Items whose title or any tag contains `query`, ignoring case.
///
/// A blank query matches nothing.
#[must_use]
pub fn search_items<'a>(items: &'a [Item], query: &str) -> Vec<&'a Item> {
    let Some(needle) = normalize(query) else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| {
            contains(&item.title, &needle) || item.tags.iter().any(|t| contains(t, &needle))
        })
        .collect()
}

/// Up to [`MAX_SUGGESTIONS`] distinct titles and tags containing `query`.
///
/// Items are visited in catalog order; for each item the title comes before
/// its tags.
#[must_use]
pub fn suggest(items: &[Item], query: &str) -> Vec<Suggestion> {
    let Some(needle) = normalize(query) else {
        return Vec::new();
    };
    if needle.chars().count() < MIN_SUGGESTION_QUERY_CHARS {
        return Vec::new();
    }

    let mut suggestions: Vec<Suggestion> = Vec::with_capacity(MAX_SUGGESTIONS);
    let candidates = items.iter().flat_map(|item| {
        std::iter::once((SuggestionKind::Title, &item.title))
            .chain(item.tags.iter().map(|tag| (SuggestionKind::Tag, tag)))
    });

    for (kind, value) in candidates {
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
        if contains(value, &needle)
            && !suggestions
                .iter()
                .any(|s| s.kind == kind && &s.value == value)
        {
            suggestions.push(Suggestion {
                kind,
                value: value.clone(),
            });
        }
    }

    suggestions
}
