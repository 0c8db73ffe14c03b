//! Offline sync queue.
//!
//! Cart snapshots and analytics batches that could not be delivered are kept
//! in durable storage and replayed in order by [`SyncQueue::flush`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use hearth_core::analytics::AnalyticsBatch;
use hearth_core::wire::CartSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::capabilities::{Capability, RequiresCapabilities};
use crate::error::ApiError;
use crate::lock_or_recover;
use crate::storage::{self, Storage, keys};

/// One deferred write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum SyncItem {
    Cart(CartSnapshot),
    Analytics(AnalyticsBatch),
}

impl SyncItem {
    async fn send(&self, api: &ApiClient) -> Result<(), ApiError> {
        match self {
            Self::Cart(snapshot) => api.sync_cart(snapshot).await.map(|_| ()),
            Self::Analytics(batch) => api.send_analytics(batch).await.map(|_| ()),
        }
    }
}

/// Persistent FIFO of deferred writes. Clones share the same queue.
#[derive(Clone)]
pub struct SyncQueue {
    items: Arc<Mutex<VecDeque<SyncItem>>>,
    storage: Arc<dyn Storage>,
}

impl SyncQueue {
    /// Load the queue left over from a previous run.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let items: VecDeque<SyncItem> = storage::load_or_default(storage.as_ref(), keys::SYNC_QUEUE);
        Self {
            items: Arc::new(Mutex::new(items)),
            storage,
        }
    }

    /// Queue an item. Only the latest cart snapshot is kept: a snapshot
    /// captured before the queued one is ignored.
    pub fn enqueue(&self, item: SyncItem) {
        let mut items = lock_or_recover(&self.items);
        if let SyncItem::Cart(incoming) = &item {
            let newer_queued = items.iter().any(|queued| {
                matches!(queued, SyncItem::Cart(q) if q.captured_at > incoming.captured_at)
            });
            if newer_queued {
                debug!(captured_at = %incoming.captured_at, "Ignoring stale cart snapshot");
                return;
            }
            items.retain(|queued| !matches!(queued, SyncItem::Cart(_)));
        }
        items.push_back(item);
        self.persist(&items);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock_or_recover(&self.items).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock_or_recover(&self.items).is_empty()
    }

    /// Replay queued items in order. Items the server refuses outright are
    /// dropped; any other failure stops the replay.
    ///
    /// Returns how many items were delivered. Undelivered items stay queued.
    pub async fn flush(&self, api: &ApiClient) -> usize {
        let mut delivered = 0;
        loop {
            let next = lock_or_recover(&self.items).front().cloned();
            let Some(item) = next else {
                break;
            };
            match item.send(api).await {
                Ok(()) => delivered += 1,
                Err(e) if e.is_rejected() => {
                    warn!(error = %e, "Server rejected queued item, dropping it");
                }
                Err(e) => {
                    warn!(error = %e, remaining = self.len(), "Sync replay failed, keeping queue");
                    break;
                }
            }
            let mut items = lock_or_recover(&self.items);
            if items.front() == Some(&item) {
                items.pop_front();
            }
            self.persist(&items);
        }
        if delivered > 0 {
            info!(delivered, "Replayed offline queue");
        }
        delivered
    }

    fn persist(&self, items: &VecDeque<SyncItem>) {
        if let Err(e) = storage::save(self.storage.as_ref(), keys::SYNC_QUEUE, items) {
            warn!(error = %e, "Failed to persist sync queue");
        }
    }
}

impl RequiresCapabilities for SyncQueue {
    const REQUIRED: &'static [Capability] = &[Capability::OfflineSync];
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use hearth_core::SessionId;

    use super::*;
    use crate::storage::MemoryStorage;

    fn snapshot() -> SyncItem {
        snapshot_at(Utc::now())
    }

    fn snapshot_at(captured_at: chrono::DateTime<Utc>) -> SyncItem {
        SyncItem::Cart(CartSnapshot {
            session_id: SessionId::parse("s").unwrap(),
            items: Vec::new(),
            captured_at,
        })
    }

    async fn serve(router: axum::Router) -> url::Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        url::Url::parse(&format!("http://{addr}/")).unwrap()
    }

    #[test]
    fn test_newer_cart_snapshot_replaces_queued_one() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let queue = SyncQueue::load(Arc::clone(&storage));
        queue.enqueue(snapshot());
        queue.enqueue(SyncItem::Analytics(AnalyticsBatch::default()));
        queue.enqueue(snapshot());
        assert_eq!(queue.len(), 2);

        let reloaded = SyncQueue::load(storage);
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_stale_cart_snapshot_does_not_replace_newer_one() {
        let queue = SyncQueue::load(Arc::new(MemoryStorage::new()));
        let now = Utc::now();
        let newer = snapshot_at(now);
        queue.enqueue(newer.clone());
        queue.enqueue(snapshot_at(now - chrono::Duration::seconds(5)));

        assert_eq!(queue.len(), 1);
        assert_eq!(lock_or_recover(&queue.items).front(), Some(&newer));
    }

    #[tokio::test]
    async fn test_rejected_item_does_not_block_cart() {
        use axum::http::StatusCode;
        use axum::routing::post;
        use hearth_core::wire::Accepted;

        let router = axum::Router::new()
            .route(
                "/api/analytics/events",
                post(|| async { (StatusCode::BAD_REQUEST, "batch too large") }),
            )
            .route(
                "/api/cart/sync",
                post(|| async { axum::Json(Accepted { accepted: 0 }) }),
            );
        let api = ApiClient::new(serve(router).await, SessionId::parse("s").unwrap());

        let queue = SyncQueue::load(Arc::new(MemoryStorage::new()));
        queue.enqueue(SyncItem::Analytics(AnalyticsBatch::default()));
        queue.enqueue(snapshot());

        assert_eq!(queue.flush(&api).await, 1);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_flush_against_unreachable_server_keeps_items() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let queue = SyncQueue::load(storage);
        queue.enqueue(SyncItem::Analytics(AnalyticsBatch::default()));

        // nothing listens on port 9 (discard) in the test environment
        let api = ApiClient::new(
            url::Url::parse("http://127.0.0.1:9/").unwrap(),
            SessionId::parse("s").unwrap(),
        );
        assert_eq!(queue.flush(&api).await, 0);
        assert_eq!(queue.len(), 1);
    }
}
