//! Publish/subscribe channel for store changes and user notices.

use hearth_core::{ProductId, ViewMode};
use rust_decimal::Decimal;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Something changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    CartChanged { item_count: u32, subtotal: Decimal },
    ComparisonChanged { ids: Vec<ProductId> },
    ProductViewed { product_id: ProductId },
    SearchRecorded { query: String },
    ViewModeChanged(ViewMode),
    PreferencesChanged,
    CatalogLoaded { product_count: usize },
    Notice(Notice),
}

/// Broadcast channel shared by every store in one client context.
///
/// Publishing never blocks and never fails; events published while nobody is
/// subscribed are dropped, and slow subscribers miss the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: StoreEvent) {
        // No receivers is fine.
        let _ = self.sender.send(event);
    }

    /// Convenience for publishing a notice.
    pub fn notify(&self, notice: Notice) {
        self.publish(StoreEvent::Notice(notice));
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(StoreEvent::ViewModeChanged(ViewMode::List));
        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::ViewModeChanged(ViewMode::List)
        );
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        EventBus::new().notify(Notice::info("hello"));
    }
}
