//! Catalog synchronization.
//!
//! A [`CatalogSource`] delivers raw rows, [`normalize`] turns them into
//! products and [`CatalogSync::run`] replaces the product table with them in
//! one transaction. Only one run proceeds at a time.

pub mod normalize;
pub mod scheduler;
pub mod source;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::Utc;
use hearth_core::wire::SyncReport;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

pub use source::{CatalogSource, HttpFeedSource, JsonFileSource, RawProduct, SourceError};

use crate::db::{ProductRepository, RepositoryError};

/// Data older than this is reported as stale by the freshness check.
pub const MAX_DATA_AGE: Duration = Duration::from_secs(25 * 60 * 60);

/// Errors that can occur during a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("catalog source error: {0}")]
    Source(#[from] SourceError),

    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// The source produced nothing usable; the stored catalog is kept.
    #[error("catalog source returned no usable rows ({received} received)")]
    Empty { received: usize },

    #[error("a catalog sync is already running")]
    Busy,
}

/// Age of the source's local data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh(Duration),
    Stale(Duration),
    /// The source has no local copy, or it cannot be inspected.
    Unknown,
}

/// Runs catalog syncs against one source.
pub struct CatalogSync {
    source: Arc<dyn CatalogSource>,
    running: Mutex<()>,
}

impl CatalogSync {
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            running: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn source(&self) -> &dyn CatalogSource {
        self.source.as_ref()
    }

    /// Fetch, normalize and store the catalog.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Busy` if another run holds the lock,
    /// `SyncError::Empty` if no row survived normalization, and
    /// `SyncError::Source`/`SyncError::Database` on I/O failures. The stored
    /// catalog is unchanged on error.
    #[instrument(skip_all, fields(source = self.source.name()))]
    pub async fn run(&self, pool: &PgPool) -> Result<SyncReport, SyncError> {
        let Ok(_guard) = self.running.try_lock() else {
            return Err(SyncError::Busy);
        };

        let rows = self.source.fetch().await?;
        let received = rows.len();
        let normalized = normalize::normalize_all(rows);
        if normalized.products.is_empty() {
            warn!(received, "Catalog source returned no usable rows");
            return Err(SyncError::Empty { received });
        }

        let imported = ProductRepository::new(pool)
            .replace_all(&normalized.products)
            .await?;

        let report = SyncReport {
            received,
            imported,
            skipped: normalized.skipped,
            finished_at: Some(Utc::now()),
        };
        info!(
            received = report.received,
            imported = report.imported,
            skipped = report.skipped,
            "Catalog sync complete"
        );
        Ok(report)
    }

    /// How old the source's local data is at `now`.
    pub async fn freshness(&self, now: SystemTime) -> Freshness {
        match self.source.last_modified().await {
            Some(modified) => classify_age(now.duration_since(modified).unwrap_or_default()),
            None => Freshness::Unknown,
        }
    }
}

fn classify_age(age: Duration) -> Freshness {
    if age > MAX_DATA_AGE {
        Freshness::Stale(age)
    } else {
        Freshness::Fresh(age)
    }
}
