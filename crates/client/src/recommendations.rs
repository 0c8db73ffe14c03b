//! Cached recommendation lookups.
//!
//! Results of [`hearth_core::recommendations::recommend`] are cached per focal
//! product for five minutes. Recording a view invalidates every other product
//! in the viewed product's category, because their co-viewed candidates may
//! have changed. The viewed product keeps its entry so reopening it is a hit.

use std::sync::Arc;
use std::time::Duration;

use hearth_core::ProductId;
use hearth_core::catalog::{Catalog, Product};
use hearth_core::recommendations::{Recommendation, recommend};
use hearth_core::session::ViewHistoryEntry;
use moka::future::Cache;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::capabilities::{Capability, RequiresCapabilities};

const CACHE_TTL: Duration = Duration::from_secs(300);
const CACHE_CAPACITY: u64 = 1000;

/// Recommendation engine front with a time-boxed cache.
#[derive(Clone)]
pub struct RecommendationService {
    cache: Cache<ProductId, Arc<Vec<Recommendation>>>,
    api: Option<ApiClient>,
}

impl RecommendationService {
    /// `api` supplies the server's base list; without it the base is empty.
    #[must_use]
    pub fn new(api: Option<ApiClient>) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();
        Self { cache, api }
    }

    /// Recommendations for `focal`, served from cache when fresh.
    pub async fn for_product(
        &self,
        focal: &Product,
        catalog: &Catalog,
        history: &[ViewHistoryEntry],
    ) -> Arc<Vec<Recommendation>> {
        if let Some(cached) = self.cache.get(&focal.id).await {
            debug!(product_id = %focal.id, "Recommendation cache hit");
            return cached;
        }

        let base = self.base_for(focal.id).await;
        let list = Arc::new(recommend(focal, catalog, history, &base));
        self.cache.insert(focal.id, Arc::clone(&list)).await;
        list
    }

    /// Server-supplied base list. Network failures degrade to an empty base.
    async fn base_for(&self, id: ProductId) -> Vec<Product> {
        let Some(api) = &self.api else {
            return Vec::new();
        };
        match api.recommendations(id).await {
            Ok(products) => products,
            Err(e) => {
                warn!(product_id = %id, error = %e, "Base recommendations unavailable");
                Vec::new()
            }
        }
    }

    /// Drop cached results of the products sharing a category with `viewed`.
    /// The entry for `viewed` itself is kept.
    pub async fn invalidate_for_view(&self, viewed: &Product, catalog: &Catalog) {
        for product in catalog
            .products()
            .iter()
            .filter(|p| p.id != viewed.id && p.category == viewed.category)
        {
            self.cache.invalidate(&product.id).await;
        }
    }

    /// Drop everything, e.g. after the catalog reloads.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    #[must_use]
    pub fn is_cached(&self, id: ProductId) -> bool {
        self.cache.contains_key(&id)
    }
}

impl RequiresCapabilities for RecommendationService {
    const REQUIRED: &'static [Capability] = &[Capability::Recommendations];
}
