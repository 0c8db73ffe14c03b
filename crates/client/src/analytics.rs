//! Analytics collector.
//!
//! Events are queued immediately and delivered in batches: when the queue
//! reaches the batch size, on a fixed timer, and once more on shutdown. A
//! batch that fails to send goes back to the front of the queue, so delivery
//! is at-least-once and the server may see duplicates.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hearth_core::SessionId;
use hearth_core::analytics::{AnalyticsBatch, AnalyticsEvent, EventQueue};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::capabilities::{Capability, RequiresCapabilities};
use crate::error::ApiError;
use crate::lock_or_recover;

/// Destination for analytics batches.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Deliver one batch.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the batch was not accepted.
    async fn send(&self, batch: &AnalyticsBatch) -> Result<(), ApiError>;
}

#[async_trait]
impl AnalyticsSink for ApiClient {
    async fn send(&self, batch: &AnalyticsBatch) -> Result<(), ApiError> {
        self.send_analytics(batch).await.map(|_| ())
    }
}

/// Buffers events and flushes them to an [`AnalyticsSink`].
pub struct AnalyticsCollector {
    inner: Arc<CollectorInner>,
    stop: watch::Sender<bool>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

struct CollectorInner {
    queue: Mutex<EventQueue>,
    sink: Arc<dyn AnalyticsSink>,
    session_id: SessionId,
    // serializes flushes so batches leave in queue order
    flushing: tokio::sync::Mutex<()>,
}

impl CollectorInner {
    /// Send batches until the queue is empty or one fails.
    async fn flush(&self) -> Result<usize, ApiError> {
        let _guard = self.flushing.lock().await;
        let mut delivered = 0;
        loop {
            let Some(batch) = lock_or_recover(&self.queue).take_batch() else {
                return Ok(delivered);
            };
            let count = batch.events.len();
            if let Err(e) = self.sink.send(&batch).await {
                warn!(count, delivered, error = %e, "Analytics flush failed, requeueing batch");
                lock_or_recover(&self.queue).requeue_front(batch);
                return Err(e);
            }
            debug!(count, "Flushed analytics batch");
            delivered += count;
        }
    }
}

impl AnalyticsCollector {
    /// Start a collector and its periodic flush task.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(
        sink: Arc<dyn AnalyticsSink>,
        session_id: SessionId,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Self {
        let inner = Arc::new(CollectorInner {
            queue: Mutex::new(EventQueue::new(batch_size)),
            sink,
            session_id,
            flushing: tokio::sync::Mutex::new(()),
        });
        let (stop, mut stopped) = watch::channel(false);

        let task_inner = Arc::clone(&inner);
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(flush_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let _ = task_inner.flush().await;
                    }
                    _ = stopped.changed() => break,
                }
            }
            debug!("Analytics flush task stopped");
        });

        Self {
            inner,
            stop,
            ticker: Mutex::new(Some(ticker)),
        }
    }

    /// Queue an event for this session. Reaching the batch size starts a
    /// background flush; the caller never waits on the network.
    pub fn track(&self, name: &str, attributes: Map<String, Value>) {
        let mut event = AnalyticsEvent::new(name, self.inner.session_id.clone(), Utc::now());
        event.attributes = attributes;
        self.track_event(event);
    }

    /// Queue a prepared event.
    pub fn track_event(&self, event: AnalyticsEvent) {
        let ready = lock_or_recover(&self.inner.queue).push(event);
        if ready {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                let _ = inner.flush().await;
            });
        }
    }

    /// Flush the whole queue now, one batch at a time. Returns the number of
    /// events delivered.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the sink rejected a batch; that batch and
    /// everything behind it stay queued.
    pub async fn flush(&self) -> Result<usize, ApiError> {
        self.inner.flush().await
    }

    /// Events waiting to be sent.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock_or_recover(&self.inner.queue).len()
    }

    /// Stop the timer and make a final flush attempt.
    ///
    /// Returns whatever could not be delivered, in batches no larger than
    /// the configured batch size, so the caller can persist it.
    pub async fn shutdown(&self) -> Vec<AnalyticsBatch> {
        let _ = self.stop.send(true);
        let ticker = lock_or_recover(&self.ticker).take();
        if let Some(handle) = ticker {
            let _ = handle.await;
        }
        if self.inner.flush().await.is_ok() {
            return Vec::new();
        }
        lock_or_recover(&self.inner.queue).drain_batches()
    }
}

impl RequiresCapabilities for AnalyticsCollector {
    const REQUIRED: &'static [Capability] = &[Capability::Analytics];
}
