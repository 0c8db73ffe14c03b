//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use hearth_core::ProductId;
use hearth_core::catalog::Product;
use hearth_core::wire::SyncReport;
use moka::future::Cache;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::sync::source::{self, CatalogSource};
use crate::sync::{CatalogSync, SyncError};

/// How long base recommendations stay cached.
pub const RECOMMENDATION_TTL: Duration = Duration::from_secs(300);
const RECOMMENDATION_CACHE_CAPACITY: u64 = 1_000;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    sync: CatalogSync,
    recommendations: Cache<ProductId, Arc<Vec<Product>>>,
}

impl AppState {
    /// Create state reading the catalog from the source `config` names.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let source = source::from_config(&config.catalog);
        Self::with_source(config, pool, source)
    }

    /// Create state with an explicit catalog source.
    #[must_use]
    pub fn with_source(
        config: StorefrontConfig,
        pool: PgPool,
        source: Arc<dyn CatalogSource>,
    ) -> Self {
        let recommendations = Cache::builder()
            .max_capacity(RECOMMENDATION_CACHE_CAPACITY)
            .time_to_live(RECOMMENDATION_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sync: CatalogSync::new(source),
                recommendations,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn catalog_sync(&self) -> &CatalogSync {
        &self.inner.sync
    }

    /// Base recommendations cached per focal product.
    #[must_use]
    pub fn recommendation_cache(&self) -> &Cache<ProductId, Arc<Vec<Product>>> {
        &self.inner.recommendations
    }

    /// Run a catalog sync and drop recommendations computed from the old data.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the run fails; the cache is kept in that case.
    pub async fn sync_catalog(&self) -> Result<SyncReport, SyncError> {
        let report = self.inner.sync.run(&self.inner.pool).await?;
        self.inner.recommendations.invalidate_all();
        Ok(report)
    }
}
