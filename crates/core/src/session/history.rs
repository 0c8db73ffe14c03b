//! Browsing history: product views, search queries and purchase intents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, SessionId};

/// Entries kept in the view history.
pub const VIEW_HISTORY_CAP: usize = 100;
/// Queries kept in the search history.
pub const SEARCH_HISTORY_CAP: usize = 10;
/// Entries kept in the purchase-intent log.
pub const INTENT_LOG_CAP: usize = 50;

/// One product view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewHistoryEntry {
    pub product_id: ProductId,
    pub timestamp: DateTime<Utc>,
    pub session_id: SessionId,
}

/// Append-only view log holding the most recent [`VIEW_HISTORY_CAP`] entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ViewHistoryEntry>", into = "Vec<ViewHistoryEntry>")]
pub struct ViewHistory {
    entries: Vec<ViewHistoryEntry>,
}

impl From<Vec<ViewHistoryEntry>> for ViewHistory {
    fn from(entries: Vec<ViewHistoryEntry>) -> Self {
        let mut history = Self::default();
        for entry in entries {
            history.record(entry);
        }
        history
    }
}

impl From<ViewHistory> for Vec<ViewHistoryEntry> {
    fn from(history: ViewHistory) -> Self {
        history.entries
    }
}

impl ViewHistory {
    /// Append a view, evicting the oldest entry past the cap.
    pub fn record(&mut self, entry: ViewHistoryEntry) {
        self.entries.push(entry);
        let excess = self.entries.len().saturating_sub(VIEW_HISTORY_CAP);
        self.entries.drain(..excess);
    }

    /// Entries oldest first.
    #[must_use]
    pub fn entries(&self) -> &[ViewHistoryEntry] {
        &self.entries
    }

    /// Up to `limit` distinct product ids, most recently viewed first.
    #[must_use]
    pub fn recent_products(&self, limit: usize) -> Vec<ProductId> {
        let mut seen = Vec::with_capacity(limit);
        for entry in self.entries.iter().rev() {
            if seen.len() >= limit {
                break;
            }
            if !seen.contains(&entry.product_id) {
                seen.push(entry.product_id);
            }
        }
        seen
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Distinct search queries, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SearchHistory {
    queries: Vec<String>,
}

impl From<Vec<String>> for SearchHistory {
    fn from(stored: Vec<String>) -> Self {
        let mut history = Self::default();
        // stored most recent first, so replay oldest first
        for query in stored.into_iter().rev() {
            history.record(&query);
        }
        history
    }
}

impl From<SearchHistory> for Vec<String> {
    fn from(history: SearchHistory) -> Self {
        history.queries
    }
}

impl SearchHistory {
    /// Record a query. Blank queries are ignored; a query already present
    /// (compared case-insensitively) moves to the front.
    pub fn record(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        let lowered = query.to_lowercase();
        self.queries.retain(|q| q.to_lowercase() != lowered);
        self.queries.insert(0, query.to_string());
        self.queries.truncate(SEARCH_HISTORY_CAP);
    }

    /// Stored queries containing `fragment`, case-insensitively.
    #[must_use]
    pub fn matching(&self, fragment: &str) -> Vec<&str> {
        let fragment = fragment.trim().to_lowercase();
        self.queries
            .iter()
            .filter(|q| q.to_lowercase().contains(&fragment))
            .map(String::as_str)
            .collect()
    }

    #[must_use]
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn clear(&mut self) {
        self.queries.clear();
    }
}

/// What the shopper did that signals purchase interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    AddToCart,
    Compare,
    Share,
}

impl IntentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddToCart => "add_to_cart",
            Self::Compare => "compare",
            Self::Share => "share",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseIntent {
    pub product_id: ProductId,
    pub kind: IntentKind,
    pub timestamp: DateTime<Utc>,
}

/// Purchase intents, oldest first, capped at [`INTENT_LOG_CAP`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PurchaseIntent>", into = "Vec<PurchaseIntent>")]
pub struct IntentLog {
    intents: Vec<PurchaseIntent>,
}

impl From<Vec<PurchaseIntent>> for IntentLog {
    fn from(mut intents: Vec<PurchaseIntent>) -> Self {
        let excess = intents.len().saturating_sub(INTENT_LOG_CAP);
        intents.drain(..excess);
        Self { intents }
    }
}

impl From<IntentLog> for Vec<PurchaseIntent> {
    fn from(log: IntentLog) -> Self {
        log.intents
    }
}

impl IntentLog {
    pub fn record(&mut self, intent: PurchaseIntent) {
        self.intents.push(intent);
        let excess = self.intents.len().saturating_sub(INTENT_LOG_CAP);
        self.intents.drain(..excess);
    }

    #[must_use]
    pub fn intents(&self) -> &[PurchaseIntent] {
        &self.intents
    }

    /// Number of recorded intents of any kind for a product.
    #[must_use]
    pub fn count_for(&self, id: ProductId) -> usize {
        self.intents.iter().filter(|i| i.product_id == id).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn entry(id: i32, minute: i64) -> ViewHistoryEntry {
        ViewHistoryEntry {
            product_id: ProductId::new(id),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minute),
            session_id: SessionId::parse("session-a").unwrap(),
        }
    }

    #[test]
    fn test_view_history_evicts_oldest() {
        let mut history = ViewHistory::default();
        for i in 0..105 {
            history.record(entry(i, i64::from(i)));
        }
        assert_eq!(history.len(), VIEW_HISTORY_CAP);
        assert_eq!(history.entries()[0].product_id, ProductId::new(5));
    }

    #[test]
    fn test_recent_products_distinct_newest_first() {
        let mut history = ViewHistory::default();
        for (i, id) in [1, 2, 1, 3].into_iter().enumerate() {
            history.record(entry(id, i64::try_from(i).unwrap()));
        }
        let ids: Vec<i32> = history
            .recent_products(5)
            .iter()
            .map(ProductId::as_i32)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_view_history_serde_roundtrip() {
        let mut history = ViewHistory::default();
        history.record(entry(1, 0));
        history.record(entry(2, 1));
        let json = serde_json::to_string(&history).unwrap();
        let parsed: ViewHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }

    #[test]
    fn test_search_history_dedups_case_insensitively() {
        let mut history = SearchHistory::default();
        history.record("Meteor");
        history.record("mk");
        history.record("  ");
        history.record("METEOR");
        assert_eq!(history.queries(), &["METEOR".to_string(), "mk".to_string()]);
    }

    #[test]
    fn test_search_history_cap() {
        let mut history = SearchHistory::default();
        for i in 0..15 {
            history.record(&format!("query {i}"));
        }
        assert_eq!(history.queries().len(), SEARCH_HISTORY_CAP);
        assert_eq!(history.queries()[0], "query 14");

        let json = serde_json::to_string(&history).unwrap();
        let parsed: SearchHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }

    #[test]
    fn test_intent_log_cap() {
        let mut log = IntentLog::default();
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        for i in 0..60 {
            log.record(PurchaseIntent {
                product_id: ProductId::new(i % 3),
                kind: IntentKind::AddToCart,
                timestamp: at,
            });
        }
        assert_eq!(log.intents().len(), INTENT_LOG_CAP);
        assert_eq!(log.intents()[0].product_id, ProductId::new(1));
        assert_eq!(
            serde_json::to_value(IntentKind::AddToCart).unwrap(),
            "add_to_cart"
        );
    }
}
