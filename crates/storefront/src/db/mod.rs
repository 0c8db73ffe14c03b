//! Database operations for the catalog `PostgreSQL` store.
//!
//! # Schema: `catalog`
//!
//! ## Tables
//!
//! - `product` - Catalog rows, replaced by each sync
//! - `product_view` - One row per product detail view
//! - `promotion` - Discount campaigns
//! - `analytics_event` - Client analytics batches
//! - `push_subscription` - Browser push endpoints
//! - `cart_snapshot` - Last cart pushed by each offline session
//! - `delivery_rates` - Optional tariff override
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p hearth-cli -- migrate
//! ```
//!
//! Queries are built at runtime (`query_as` + `FromRow`) so the crate builds
//! without a live database.

pub mod analytics;
pub mod carts;
pub mod products;
pub mod promotions;
pub mod rates;
pub mod subscriptions;
pub mod views;

use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use analytics::AnalyticsRepository;
pub use carts::CartRepository;
pub use products::{CatalogStats, NewProduct, ProductRepository, ProductUpdate};
pub use promotions::{NewPromotion, PromotionRepository};
pub use rates::RateRepository;
pub use subscriptions::SubscriptionRepository;
pub use views::{NewView, ViewRepository};

/// Embedded storefront migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate article).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique-violation errors to `Conflict`, everything else to `Database`.
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Midnight UTC of the day containing `now`.
pub(crate) fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
