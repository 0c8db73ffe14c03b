use chrono::Utc;
use hearth_core::session::{
    IntentKind, IntentLog, PurchaseIntent, SearchHistory, ViewHistory, ViewHistoryEntry,
};
use hearth_core::{ProductId, SessionId};

use super::StoreContext;
use crate::events::StoreEvent;
use crate::storage::keys;

/// Product views, search queries and purchase intents.
pub struct HistoryStore {
    views: ViewHistory,
    searches: SearchHistory,
    intents: IntentLog,
    ctx: StoreContext,
}

impl HistoryStore {
    #[must_use]
    pub fn load(ctx: StoreContext) -> Self {
        Self {
            views: ctx.load(keys::VIEW_HISTORY),
            searches: ctx.load(keys::SEARCH_HISTORY),
            intents: ctx.load(keys::PURCHASE_INTENTS),
            ctx,
        }
    }

    /// Append a product view stamped with the current time.
    pub fn record_view(&mut self, product_id: ProductId, session_id: SessionId) {
        self.views.record(ViewHistoryEntry {
            product_id,
            timestamp: Utc::now(),
            session_id,
        });
        self.ctx.persist(keys::VIEW_HISTORY, &self.views);
        self.ctx.publish(StoreEvent::ProductViewed { product_id });
    }

    /// Remember a search query. Blank queries are ignored.
    pub fn record_search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.searches.record(query);
        self.ctx.persist(keys::SEARCH_HISTORY, &self.searches);
        self.ctx.publish(StoreEvent::SearchRecorded {
            query: query.to_string(),
        });
    }

    pub fn record_intent(&mut self, product_id: ProductId, kind: IntentKind) {
        self.intents.record(PurchaseIntent {
            product_id,
            kind,
            timestamp: Utc::now(),
        });
        self.ctx.persist(keys::PURCHASE_INTENTS, &self.intents);
    }

    /// View log, oldest first.
    #[must_use]
    pub fn views(&self) -> &[ViewHistoryEntry] {
        self.views.entries()
    }

    /// Recently viewed distinct products, newest first.
    #[must_use]
    pub fn recently_viewed(&self, limit: usize) -> Vec<ProductId> {
        self.views.recent_products(limit)
    }

    #[must_use]
    pub const fn searches(&self) -> &SearchHistory {
        &self.searches
    }

    #[must_use]
    pub fn intents(&self) -> &[PurchaseIntent] {
        self.intents.intents()
    }

    pub fn clear_views(&mut self) {
        self.views.clear();
        self.ctx.persist(keys::VIEW_HISTORY, &self.views);
    }

    pub fn clear_searches(&mut self) {
        self.searches.clear();
        self.ctx.persist(keys::SEARCH_HISTORY, &self.searches);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::events::EventBus;
    use crate::storage::{MemoryStorage, Storage};

    #[test]
    fn test_history_survives_reload() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let session = SessionId::parse("s-1").unwrap();
        let mut store = HistoryStore::load(StoreContext::new(Arc::clone(&storage), EventBus::new()));
        store.record_view(ProductId::new(1), session.clone());
        store.record_view(ProductId::new(2), session);
        store.record_search("Meteor");
        store.record_search("   ");
        store.record_intent(ProductId::new(2), IntentKind::Compare);

        let reloaded = HistoryStore::load(StoreContext::new(storage, EventBus::new()));
        assert_eq!(reloaded.views(), store.views());
        assert_eq!(reloaded.searches().queries(), &["Meteor".to_string()]);
        assert_eq!(reloaded.intents().len(), 1);
        assert_eq!(
            reloaded.recently_viewed(5),
            vec![ProductId::new(2), ProductId::new(1)]
        );
    }
}
