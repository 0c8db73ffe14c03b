//! Hearth catalog client.
//!
//! The shopper-facing half of the Hearth store: session stores persisted to
//! durable storage, the storefront API client, batched analytics, cached
//! recommendations, the delivery calculator, promotion notices and an offline
//! sync queue. [`App`] wires these together and is the only thing a UI layer
//! talks to.
//!
//! # Modules
//!
//! - [`stores`] - Cart, comparison, history and preference stores
//! - [`storage`] - Key/value persistence (files or memory)
//! - [`api`] - Storefront JSON API client
//! - [`analytics`] - Batched event delivery
//! - [`app`] - Coordinator and UI actions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod api;
pub mod app;
pub mod capabilities;
pub mod config;
pub mod context;
pub mod delivery;
pub mod error;
pub mod events;
pub mod notifications;
pub mod recommendations;
pub mod search;
pub mod share;
pub mod storage;
pub mod stores;
pub mod sync;

use std::sync::{Mutex, MutexGuard};

use tracing::warn;

pub use app::{ActionOutcome, App, ProductDetail, UiAction};
pub use config::ClientConfig;
pub use context::ClientContext;
pub use error::{ClientError, Result};

/// Lock a mutex, taking the data back if a previous holder panicked.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Mutex poisoned (previous holder panicked), recovering");
            poisoned.into_inner()
        }
    }
}
