//! Handles shared by every client component.

use std::sync::Arc;

use crate::capabilities::CapabilityRegistry;
use crate::config::ClientConfig;
use crate::error::StorageError;
use crate::events::EventBus;
use crate::storage::{FileStorage, MemoryStorage, Storage};
use crate::stores::StoreContext;

/// Configuration, storage, events and enabled capabilities.
///
/// Cloning is cheap; clones share storage and the event bus.
#[derive(Clone)]
pub struct ClientContext {
    config: ClientConfig,
    storage: Arc<dyn Storage>,
    events: EventBus,
    capabilities: CapabilityRegistry,
}

impl ClientContext {
    /// Build a context around an existing storage backend.
    #[must_use]
    pub fn new(config: ClientConfig, storage: Arc<dyn Storage>) -> Self {
        let capabilities = CapabilityRegistry::without(&config.disabled_capabilities);
        Self {
            config,
            storage,
            events: EventBus::new(),
            capabilities,
        }
    }

    /// Build a context with file storage under `state_dir`, or memory storage
    /// when none is configured.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state directory cannot be created.
    pub fn from_config(config: ClientConfig) -> Result<Self, StorageError> {
        let storage: Arc<dyn Storage> = match &config.state_dir {
            Some(dir) => Arc::new(FileStorage::open(dir)?),
            None => Arc::new(MemoryStorage::new()),
        };
        Ok(Self::new(config, storage))
    }

    /// Handles for constructing a store.
    #[must_use]
    pub fn store_context(&self) -> StoreContext {
        StoreContext::new(Arc::clone(&self.storage), self.events.clone())
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage)
    }

    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    #[must_use]
    pub const fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }
}
