//! Search-as-you-type suggestions.

use hearth_core::ProductId;
use hearth_core::catalog::Catalog;
use hearth_core::session::SearchHistory;

/// Shortest query that produces suggestions, in characters.
pub const MIN_QUERY_CHARS: usize = 2;
/// Most suggestions returned.
pub const MAX_SUGGESTIONS: usize = 8;

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    /// A query the shopper searched for before.
    History,
    /// A product name.
    Product(ProductId),
    /// A catalog category.
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub kind: SuggestionKind,
}

/// Suggestions for `query`: past searches first, then product names, then
/// categories. Matching is case-insensitive substring; texts are unique.
#[must_use]
pub fn suggest(query: &str, history: &SearchHistory, catalog: &Catalog) -> Vec<Suggestion> {
    let needle = query.trim().to_lowercase();
    if needle.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }

    let mut out: Vec<Suggestion> = Vec::with_capacity(MAX_SUGGESTIONS);
    let mut push = |text: &str, kind: SuggestionKind| {
        if out.len() >= MAX_SUGGESTIONS {
            return;
        }
        let lowered = text.to_lowercase();
        if out.iter().any(|s| s.text.to_lowercase() == lowered) {
            return;
        }
        out.push(Suggestion {
            text: text.to_string(),
            kind,
        });
    };

    for past in history.matching(&needle) {
        push(past, SuggestionKind::History);
    }
    for product in catalog.products() {
        if product.name.to_lowercase().contains(&needle) {
            push(&product.name, SuggestionKind::Product(product.id));
        }
    }
    for category in catalog.categories() {
        if category.to_lowercase().contains(&needle) {
            push(&category, SuggestionKind::Category);
        }
    }
    out
}
