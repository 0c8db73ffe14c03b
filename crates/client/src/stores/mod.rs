//! Session state stores.
//!
//! Each store owns one collection from `hearth_core::session`, loads it from
//! durable storage on construction and, after every mutation, persists it and
//! publishes a [`StoreEvent`](crate::events::StoreEvent). Stores are
//! single-owner: mutations take `&mut self` and run to completion.

mod cart;
mod comparison;
mod history;
mod preferences;

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::events::{EventBus, StoreEvent};
use crate::storage::{self, Storage};

pub use cart::CartStore;
pub use comparison::ComparisonStore;
pub use history::HistoryStore;
pub use preferences::PreferencesStore;

/// Storage and event handles shared by every store.
#[derive(Clone)]
pub struct StoreContext {
    storage: Arc<dyn Storage>,
    events: EventBus,
}

impl StoreContext {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, events: EventBus) -> Self {
        Self { storage, events }
    }

    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    fn load<T>(&self, key: &str) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        storage::load_or_default(self.storage(), key)
    }

    /// Persist a value. A failed write keeps the in-memory state and is logged.
    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = storage::save(self.storage(), key, value) {
            warn!(key, error = %e, "Failed to persist client state");
        }
    }

    fn publish(&self, event: StoreEvent) {
        self.events.publish(event);
    }
}
