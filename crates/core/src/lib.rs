//! Hearth Core - shared catalog types and pure calculators.
//!
//! This crate is used by every Hearth component:
//! - `hearth-client` - client application state, stores and coordinator
//! - `hearth-storefront` - catalog server and JSON API
//! - `hearth-cli` - migrations, seeding and one-shot tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients, no clock reads. Callers pass `now`
//! explicitly where time matters.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices and small shared enums
//! - [`catalog`] - Products, promotions and listing filters
//! - [`delivery`] - Delivery zones and the shipping cost calculator
//! - [`recommendations`] - Session clustering and related-product ranking
//! - [`session`] - Cart, comparison, history and preference collections
//! - [`analytics`] - Analytics events and their send queue
//! - [`wire`] - JSON bodies shared by the API server and client

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod catalog;
pub mod delivery;
pub mod recommendations;
pub mod session;
pub mod types;
pub mod wire;

pub use types::*;
