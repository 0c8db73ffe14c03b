//! Analytics events and the in-memory queue they wait in until flushed.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::SessionId;

/// Default number of queued events that triggers a flush.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Largest batch the server accepts in one request.
pub const MAX_BATCH_EVENTS: usize = 500;

/// A discrete shopper action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub name: String,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl AnalyticsEvent {
    #[must_use]
    pub fn new(name: impl Into<String>, session_id: SessionId, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            session_id,
            timestamp,
            attributes: Map::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Wire body for batch submission: `{"events": [...]}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticsBatch {
    pub events: Vec<AnalyticsEvent>,
}

/// FIFO of events awaiting delivery.
#[derive(Debug, Clone)]
pub struct EventQueue {
    events: VecDeque<AnalyticsEvent>,
    batch_size: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl EventQueue {
    /// A queue that reports readiness once `batch_size` events are waiting.
    ///
    /// Batches never exceed `batch_size`, which is capped at
    /// [`MAX_BATCH_EVENTS`].
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        Self {
            events: VecDeque::new(),
            batch_size: batch_size.clamp(1, MAX_BATCH_EVENTS),
        }
    }

    /// Enqueue an event. Returns `true` when the batch threshold is reached.
    pub fn push(&mut self, event: AnalyticsEvent) -> bool {
        self.events.push_back(event);
        self.is_ready()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.events.len() >= self.batch_size
    }

    /// Take up to `batch_size` of the oldest events. `None` when empty.
    pub fn take_batch(&mut self) -> Option<AnalyticsBatch> {
        if self.events.is_empty() {
            return None;
        }
        let count = self.events.len().min(self.batch_size);
        Some(AnalyticsBatch {
            events: self.events.drain(..count).collect(),
        })
    }

    /// Drain the whole queue as a sequence of batches, oldest first.
    pub fn drain_batches(&mut self) -> Vec<AnalyticsBatch> {
        std::iter::from_fn(|| self.take_batch()).collect()
    }

    /// Put a batch that failed to send back at the front, ahead of events
    /// queued in the meantime.
    pub fn requeue_front(&mut self, batch: AnalyticsBatch) {
        for event in batch.events.into_iter().rev() {
            self.events.push_front(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn event(name: &str) -> AnalyticsEvent {
        AnalyticsEvent::new(name, SessionId::parse("s-1").unwrap(), Utc::now())
    }

    #[test]
    fn test_threshold_reported_at_batch_size() {
        let mut queue = EventQueue::new(3);
        assert!(!queue.push(event("a")));
        assert!(!queue.push(event("b")));
        assert!(queue.push(event("c")));
    }

    #[test]
    fn test_failed_batch_goes_back_to_front() {
        let mut queue = EventQueue::new(10);
        queue.push(event("first"));
        queue.push(event("second"));
        let batch = queue.take_batch().unwrap();
        assert!(queue.is_empty());

        queue.push(event("later"));
        queue.requeue_front(batch);

        let names: Vec<String> = queue
            .take_batch()
            .unwrap()
            .events
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["first", "second", "later"]);
    }

    #[test]
    fn test_batch_wire_shape() {
        let batch = AnalyticsBatch {
            events: vec![event("product_view").with("product_id", 7)],
        };
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["events"][0]["name"], "product_view");
        assert_eq!(json["events"][0]["attributes"]["product_id"], 7);
        assert_eq!(json["events"][0]["session_id"], "s-1");
    }

    #[test]
    fn test_backlog_is_taken_in_bounded_batches() {
        let mut queue = EventQueue::new(10);
        for i in 0..25 {
            queue.push(event(&format!("e{i}")));
        }

        let first = queue.take_batch().unwrap();
        assert_eq!(first.events.len(), 10);
        assert_eq!(first.events[0].name, "e0");
        assert_eq!(queue.len(), 15);

        let sizes: Vec<usize> = queue.drain_batches().iter().map(|b| b.events.len()).collect();
        assert_eq!(sizes, vec![10, 5]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_batch_size_capped_at_server_limit() {
        let mut queue = EventQueue::new(10_000);
        for _ in 0..MAX_BATCH_EVENTS + 1 {
            queue.push(event("view"));
        }
        assert_eq!(queue.take_batch().unwrap().events.len(), MAX_BATCH_EVENTS);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_empty_queue_has_no_batch() {
        assert!(EventQueue::default().take_batch().is_none());
    }
}
