//! Application coordinator.
//!
//! [`App`] owns the catalog snapshot, the current filter and every store, and
//! turns [`UiAction`]s into store mutations. Optional components are built
//! once in [`App::start`] according to the capability registry and are simply
//! absent when disabled.
//!
//! Network writes triggered by user actions run on spawned tasks; `dispatch`
//! never waits on them.

use std::sync::Arc;

use chrono::Utc;
use hearth_core::ProductId;
use hearth_core::catalog::{Catalog, Product, ProductFilter, Promotion};
use hearth_core::delivery::{DeliveryQuote, RateTable};
use hearth_core::recommendations::Recommendation;
use hearth_core::session::{ComparisonError, IntentKind};
use hearth_core::wire::CartSnapshot;
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use crate::analytics::{AnalyticsCollector, AnalyticsSink};
use crate::api::ApiClient;
use crate::capabilities::Capability;
use crate::context::ClientContext;
use crate::delivery::DeliveryForm;
use crate::error::ClientError;
use crate::events::{Notice, StoreEvent};
use crate::notifications::{self, NotificationCenter};
use crate::recommendations::RecommendationService;
use crate::search::{Suggestion, suggest};
use crate::share::{SharePlatform, product_url, share_link};
use crate::stores::{CartStore, ComparisonStore, HistoryStore, PreferencesStore};
use crate::sync::{SyncItem, SyncQueue};

/// A user interaction the coordinator handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    AddToCart { product_id: ProductId, quantity: u32 },
    DecrementCart(ProductId),
    RemoveFromCart(ProductId),
    ToggleCompare(ProductId),
    ClearComparison,
    /// Submit a search: recorded in history and applied to the filter.
    Search(String),
    /// Search-as-you-type; nothing is recorded.
    Suggest(String),
    SetCategory(Option<String>),
    ToggleViewMode,
    Share {
        product_id: ProductId,
        platform: SharePlatform,
    },
    CalculateDelivery(DeliveryForm),
}

/// What a dispatched action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    Suggestions(Vec<Suggestion>),
    ShareLink(String),
    DeliveryQuote(DeliveryQuote),
    /// The action was refused; the notice says why and was also published.
    Rejected(Notice),
}

/// Everything the product page shows.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub recommendations: Arc<Vec<Recommendation>>,
    pub in_comparison: bool,
    pub cart_quantity: u32,
}

/// The client application.
pub struct App {
    ctx: ClientContext,
    api: ApiClient,
    catalog: Catalog,
    filter: ProductFilter,
    rates: RateTable,
    cart: CartStore,
    comparison: ComparisonStore,
    history: HistoryStore,
    preferences: PreferencesStore,
    analytics: Option<AnalyticsCollector>,
    recommendations: Option<RecommendationService>,
    notifications: Option<NotificationCenter>,
    sync: Option<SyncQueue>,
}

impl App {
    /// Wire up the application. Analytics go to the storefront API.
    ///
    /// Must be called from within a tokio runtime when analytics are enabled.
    #[must_use]
    pub fn start(ctx: ClientContext) -> Self {
        Self::build(ctx, None)
    }

    /// Like [`App::start`], delivering analytics to `sink` instead.
    #[must_use]
    pub fn with_analytics_sink(ctx: ClientContext, sink: Arc<dyn AnalyticsSink>) -> Self {
        Self::build(ctx, Some(sink))
    }

    fn build(ctx: ClientContext, sink: Option<Arc<dyn AnalyticsSink>>) -> Self {
        let preferences = PreferencesStore::load(ctx.store_context());
        let session_id = preferences.session_id().clone();
        let config = ctx.config();
        let api = ApiClient::new(config.api_base_url.clone(), session_id.clone());
        let capabilities = ctx.capabilities();

        let analytics = capabilities.supports::<AnalyticsCollector>().then(|| {
            let sink = sink.unwrap_or_else(|| Arc::new(api.clone()) as Arc<dyn AnalyticsSink>);
            AnalyticsCollector::start(
                sink,
                session_id.clone(),
                config.analytics_batch_size,
                config.analytics_flush_interval,
            )
        });
        let recommendations = capabilities
            .supports::<RecommendationService>()
            .then(|| RecommendationService::new(Some(api.clone())));
        let notifications = capabilities
            .supports::<NotificationCenter>()
            .then(NotificationCenter::new);
        let sync = capabilities
            .supports::<SyncQueue>()
            .then(|| SyncQueue::load(ctx.storage()));

        let enabled: Vec<&str> = capabilities.enabled().map(Capability::as_str).collect();
        info!(session_id = %session_id, capabilities = ?enabled, "Client started");

        Self {
            cart: CartStore::load(ctx.store_context()),
            comparison: ComparisonStore::load(ctx.store_context()),
            history: HistoryStore::load(ctx.store_context()),
            preferences,
            api,
            catalog: Catalog::default(),
            filter: ProductFilter::default(),
            rates: RateTable::default(),
            analytics,
            recommendations,
            notifications,
            sync,
            ctx,
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replace the catalog snapshot from the server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on network failure. A notice is published and
    /// the previous snapshot stays in place.
    #[instrument(skip_all)]
    pub async fn load_catalog(&mut self) -> Result<usize, ClientError> {
        let products = match self.api.products(&ProductFilter::default()).await {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, "Catalog load failed");
                self.ctx
                    .events()
                    .notify(Notice::error("Не удалось загрузить каталог. Попробуйте позже."));
                return Err(e.into());
            }
        };

        self.set_catalog(products);
        let product_count = self.catalog.len();
        info!(product_count, "Catalog loaded");
        Ok(product_count)
    }

    /// Fetch the delivery rate table and promotions. Failures keep defaults.
    #[instrument(skip_all)]
    pub async fn load_reference_data(&mut self) {
        if self.ctx.capabilities().is_enabled(Capability::Delivery) {
            match self.api.delivery_rates().await {
                Ok(rates) => self.rates = rates,
                Err(e) => warn!(error = %e, "Using default delivery rates"),
            }
        }
        if let Some(center) = &mut self.notifications {
            match self.api.promotions().await {
                Ok(promotions) => center.set_promotions(promotions),
                Err(e) => warn!(error = %e, "Promotions unavailable"),
            }
        }
    }

    /// Replace the catalog snapshot directly, e.g. from a cached copy.
    pub fn set_catalog(&mut self, products: Vec<Product>) {
        self.catalog = Catalog::new(products);
        if let Some(service) = &self.recommendations {
            service.invalidate_all();
        }
        self.ctx.events().publish(StoreEvent::CatalogLoaded {
            product_count: self.catalog.len(),
        });
    }

    // =========================================================================
    // Browsing
    // =========================================================================

    pub fn set_filter(&mut self, filter: ProductFilter) {
        self.filter = filter;
    }

    #[must_use]
    pub const fn filter(&self) -> &ProductFilter {
        &self.filter
    }

    /// Catalog products passing the current filter, in display order.
    #[must_use]
    pub fn visible_products(&self) -> Vec<&Product> {
        self.catalog.filter(&self.filter)
    }

    /// Open a product page: record the view and gather recommendations.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ProductNotFound` if the id is not in the catalog.
    #[instrument(skip(self))]
    pub async fn open_product(&mut self, id: ProductId) -> Result<ProductDetail, ClientError> {
        let Some(product) = self.catalog.get(id).cloned() else {
            warn!(product_id = %id, "Product not in catalog");
            return Err(ClientError::ProductNotFound(id));
        };

        self.history
            .record_view(id, self.preferences.session_id().clone());

        // The server counts the view when the detail is fetched.
        let api = self.api.clone();
        tokio::spawn(async move {
            if let Err(e) = api.product(id).await {
                debug!(product_id = %id, error = %e, "View not reported");
            }
        });

        self.track(
            "product_view",
            attributes([
                ("product_id", json!(id)),
                ("category", json!(product.category)),
                ("price", json!(product.price)),
            ]),
        );

        let recommendations = match &self.recommendations {
            Some(service) => {
                let list = service
                    .for_product(&product, &self.catalog, self.history.views())
                    .await;
                service.invalidate_for_view(&product, &self.catalog).await;
                list
            }
            None => Arc::new(Vec::new()),
        };

        Ok(ProductDetail {
            in_comparison: self.comparison.contains(id),
            cart_quantity: self.cart.cart().get(id).map_or(0, |item| item.quantity),
            product,
            recommendations,
        })
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Apply a user action.
    ///
    /// Must be called from within a tokio runtime; cart changes spawn a sync.
    pub fn dispatch(&mut self, action: UiAction) -> ActionOutcome {
        let result = match action {
            UiAction::AddToCart {
                product_id,
                quantity,
            } => self.add_to_cart(product_id, quantity),
            UiAction::DecrementCart(id) => self
                .cart
                .decrement(id)
                .map(|_| self.sync_cart())
                .map_err(ClientError::from),
            UiAction::RemoveFromCart(id) => {
                if self.cart.remove(id) {
                    self.sync_cart();
                }
                Ok(())
            }
            UiAction::ToggleCompare(id) => self.toggle_compare(id),
            UiAction::ClearComparison => {
                self.comparison.clear();
                Ok(())
            }
            UiAction::Search(query) => {
                self.search(&query);
                Ok(())
            }
            UiAction::Suggest(query) => {
                return ActionOutcome::Suggestions(suggest(
                    &query,
                    self.history.searches(),
                    &self.catalog,
                ));
            }
            UiAction::SetCategory(category) => {
                self.filter.category = category;
                Ok(())
            }
            UiAction::ToggleViewMode => {
                self.preferences.toggle_view_mode();
                Ok(())
            }
            UiAction::Share {
                product_id,
                platform,
            } => match self.share(product_id, platform) {
                Ok(link) => return ActionOutcome::ShareLink(link),
                Err(e) => Err(e),
            },
            UiAction::CalculateDelivery(form) => match self.calculate_delivery(&form) {
                Ok(quote) => return ActionOutcome::DeliveryQuote(quote),
                Err(e) => Err(e),
            },
        };

        match result {
            Ok(()) => ActionOutcome::Done,
            Err(e) => {
                debug!(error = %e, "Action rejected");
                let notice = rejection_notice(&e);
                self.ctx.events().notify(notice.clone());
                ActionOutcome::Rejected(notice)
            }
        }
    }

    fn product(&self, id: ProductId) -> Result<&Product, ClientError> {
        self.catalog.get(id).ok_or_else(|| {
            warn!(product_id = %id, "Product not in catalog");
            ClientError::ProductNotFound(id)
        })
    }

    fn add_to_cart(&mut self, id: ProductId, quantity: u32) -> Result<(), ClientError> {
        let product = self.product(id)?.clone();
        let total = self.cart.add(&product, quantity)?;
        self.history.record_intent(id, IntentKind::AddToCart);
        self.track(
            "add_to_cart",
            attributes([
                ("product_id", json!(id)),
                ("quantity", json!(quantity)),
                ("line_quantity", json!(total)),
            ]),
        );
        self.sync_cart();
        Ok(())
    }

    fn toggle_compare(&mut self, id: ProductId) -> Result<(), ClientError> {
        self.product(id)?;
        if self.comparison.toggle(id)? {
            self.history.record_intent(id, IntentKind::Compare);
            self.track("compare_add", attributes([("product_id", json!(id))]));
        }
        Ok(())
    }

    fn search(&mut self, query: &str) {
        let trimmed = query.trim();
        self.history.record_search(trimmed);
        self.filter.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        let results = self.visible_products().len();
        self.track(
            "search",
            attributes([("query", json!(trimmed)), ("results", json!(results))]),
        );
    }

    fn share(&mut self, id: ProductId, platform: SharePlatform) -> Result<String, ClientError> {
        self.ctx.capabilities().require(Capability::Sharing)?;
        let product = self.product(id)?;
        let page = product_url(&self.ctx.config().share_base_url, product)?;
        let link = share_link(platform, &page, &product.name);
        self.history.record_intent(id, IntentKind::Share);
        self.track(
            "share",
            attributes([
                ("product_id", json!(id)),
                ("platform", json!(platform.as_str())),
            ]),
        );
        Ok(link)
    }

    fn calculate_delivery(&self, form: &DeliveryForm) -> Result<DeliveryQuote, ClientError> {
        self.ctx.capabilities().require(Capability::Delivery)?;
        let quote = form.calculate(&self.rates)?;
        self.track(
            "delivery_calculated",
            attributes([
                ("city", json!(form.city.trim())),
                ("zone", json!(quote.zone.rank)),
            ]),
        );
        Ok(quote)
    }

    /// Push the cart to the server in the background; queue it on failure.
    fn sync_cart(&self) {
        let snapshot = CartSnapshot {
            session_id: self.preferences.session_id().clone(),
            items: self.cart.items().to_vec(),
            captured_at: Utc::now(),
        };
        let api = self.api.clone();
        let queue = self.sync.clone();
        tokio::spawn(async move {
            if let Err(e) = api.sync_cart(&snapshot).await {
                debug!(error = %e, "Cart sync deferred");
                if let Some(queue) = queue {
                    queue.enqueue(SyncItem::Cart(snapshot));
                }
            }
        });
    }

    fn track(&self, name: &str, attributes: Map<String, Value>) {
        if let Some(analytics) = &self.analytics {
            analytics.track(name, attributes);
        }
    }

    // =========================================================================
    // Notifications and sync
    // =========================================================================

    /// Active promotions the shopper has not been shown yet.
    pub fn pending_promotions(&mut self) -> Vec<Promotion> {
        match &self.notifications {
            Some(center) => center.take_unseen(&mut self.preferences, Utc::now()),
            None => Vec::new(),
        }
    }

    /// Register a push subscription with the server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unavailable` when notifications are disabled and
    /// `ClientError::Api` when the server refuses.
    pub async fn subscribe_push(&mut self, endpoint: &str, keys: Value) -> Result<(), ClientError> {
        self.ctx.capabilities().require(Capability::Notifications)?;
        notifications::subscribe_push(&self.api, &mut self.preferences, endpoint, keys).await?;
        Ok(())
    }

    /// Replay the offline queue. Returns how many items were delivered.
    pub async fn flush_offline(&self) -> usize {
        match &self.sync {
            Some(queue) => queue.flush(&self.api).await,
            None => 0,
        }
    }

    /// Stop background work. Undelivered analytics move to the offline queue.
    #[instrument(skip_all)]
    pub async fn shutdown(&self) {
        let Some(analytics) = &self.analytics else {
            return;
        };
        let leftover = analytics.shutdown().await;
        if leftover.is_empty() {
            return;
        }
        let events: usize = leftover.iter().map(|batch| batch.events.len()).sum();
        match &self.sync {
            Some(queue) => {
                info!(events, batches = leftover.len(), "Queued undelivered analytics");
                for batch in leftover {
                    queue.enqueue(SyncItem::Analytics(batch));
                }
            }
            None => warn!(events, "Dropping undelivered analytics"),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn context(&self) -> &ClientContext {
        &self.ctx
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn rates(&self) -> &RateTable {
        &self.rates
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn comparison(&self) -> &ComparisonStore {
        &self.comparison
    }

    #[must_use]
    pub const fn history(&self) -> &HistoryStore {
        &self.history
    }

    #[must_use]
    pub const fn preferences(&self) -> &PreferencesStore {
        &self.preferences
    }

    pub const fn preferences_mut(&mut self) -> &mut PreferencesStore {
        &mut self.preferences
    }

    #[must_use]
    pub const fn analytics(&self) -> Option<&AnalyticsCollector> {
        self.analytics.as_ref()
    }

    #[must_use]
    pub const fn sync_queue(&self) -> Option<&SyncQueue> {
        self.sync.as_ref()
    }

    /// Cart form for the delivery calculator, pre-filled from the cart.
    #[must_use]
    pub fn delivery_form(&self) -> DeliveryForm {
        DeliveryForm::for_cart(self.cart.total_weight(), self.cart.subtotal())
    }
}

/// The message shown to the shopper for a refused action.
fn rejection_notice(error: &ClientError) -> Notice {
    match error {
        ClientError::Comparison(ComparisonError::Full { max }) => {
            Notice::warning(format!("Можно сравнить не более {max} товаров"))
        }
        ClientError::ProductNotFound(_) => Notice::warning("Товар не найден"),
        ClientError::Validation(e) => Notice::warning(e.to_string()),
        ClientError::Unavailable(capability) => {
            Notice::info(format!("Функция недоступна: {capability}"))
        }
        other => Notice::error(other.to_string()),
    }
}

fn attributes<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use hearth_core::analytics::AnalyticsBatch;
    use hearth_core::types::ViewMode;
    use rust_decimal::Decimal;
    use url::Url;

    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ApiError;
    use crate::storage::MemoryStorage;
    use crate::test_support::product;

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<AnalyticsBatch>>,
    }

    #[async_trait]
    impl AnalyticsSink for RecordingSink {
        async fn send(&self, batch: &AnalyticsBatch) -> Result<(), ApiError> {
            self.batches.lock().unwrap().push(batch.clone());
            Ok(())
        }
    }

    fn config() -> ClientConfig {
        // nothing listens on port 9 (discard) in the test environment
        let mut config = ClientConfig::new(Url::parse("http://127.0.0.1:9/").unwrap());
        config.share_base_url = Url::parse("https://shop.example/").unwrap();
        config
    }

    fn app_with(config: ClientConfig) -> (App, Arc<RecordingSink>) {
        let ctx = ClientContext::new(config, Arc::new(MemoryStorage::new()));
        let sink = Arc::new(RecordingSink::default());
        let mut app = App::with_analytics_sink(ctx, Arc::clone(&sink) as Arc<dyn AnalyticsSink>);
        let mut boiler = product(1, "meteor", 42_000);
        boiler.name = "Meteor T2 24".to_string();
        app.set_catalog(vec![
            boiler,
            product(2, "meteor", 45_000),
            product(3, "mk", 30_000),
            product(4, "mk", 31_000),
            product(5, "laggartt", 50_000),
        ]);
        (app, sink)
    }

    fn app() -> App {
        app_with(config()).0
    }

    #[tokio::test]
    async fn test_add_to_cart_records_intent() {
        let mut app = app();
        let outcome = app.dispatch(UiAction::AddToCart {
            product_id: ProductId::new(1),
            quantity: 2,
        });
        assert_eq!(outcome, ActionOutcome::Done);
        assert_eq!(app.cart().count(), 2);
        assert_eq!(app.cart().subtotal(), Decimal::new(84_000, 0));
        assert_eq!(app.history().intents().len(), 1);
        assert_eq!(app.analytics().unwrap().pending(), 1);
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let mut app = app();
        let mut events = app.context().events().subscribe();
        let outcome = app.dispatch(UiAction::AddToCart {
            product_id: ProductId::new(99),
            quantity: 1,
        });
        assert!(matches!(outcome, ActionOutcome::Rejected(_)));
        assert!(app.cart().items().is_empty());
        assert!(matches!(events.try_recv().unwrap(), StoreEvent::Notice(_)));
    }

    #[tokio::test]
    async fn test_fifth_comparison_rejected_with_notice() {
        let mut app = app();
        for id in 1..=4 {
            assert_eq!(
                app.dispatch(UiAction::ToggleCompare(ProductId::new(id))),
                ActionOutcome::Done
            );
        }
        let outcome = app.dispatch(UiAction::ToggleCompare(ProductId::new(5)));
        let ActionOutcome::Rejected(notice) = outcome else {
            panic!("expected rejection");
        };
        assert!(notice.message.contains('4'));
        assert_eq!(app.comparison().ids().len(), 4);

        app.dispatch(UiAction::ClearComparison);
        assert!(app.comparison().ids().is_empty());
    }

    #[tokio::test]
    async fn test_search_filters_and_records_history() {
        let mut app = app();
        app.dispatch(UiAction::Search("  meteor t2 ".to_string()));
        assert_eq!(app.filter().search.as_deref(), Some("meteor t2"));
        assert_eq!(app.visible_products().len(), 1);
        assert_eq!(app.history().searches().queries()[0], "meteor t2");

        let ActionOutcome::Suggestions(suggestions) = app.dispatch(UiAction::Suggest("met".to_string()))
        else {
            panic!("expected suggestions");
        };
        assert_eq!(suggestions[0].text, "meteor t2");
    }

    #[tokio::test]
    async fn test_category_and_view_mode() {
        let mut app = app();
        app.dispatch(UiAction::SetCategory(Some("mk".to_string())));
        assert_eq!(app.visible_products().len(), 2);
        app.dispatch(UiAction::SetCategory(None));
        assert_eq!(app.visible_products().len(), 5);

        app.dispatch(UiAction::ToggleViewMode);
        assert_eq!(app.preferences().view_mode(), ViewMode::List);
    }

    #[tokio::test]
    async fn test_open_product_returns_recommendations() {
        let mut app = app();
        let detail = app.open_product(ProductId::new(1)).await.unwrap();
        assert_eq!(detail.product.id, ProductId::new(1));
        assert!(!detail.in_comparison);
        assert_eq!(detail.cart_quantity, 0);
        assert!(detail.recommendations.iter().any(|r| r.product.id == ProductId::new(2)));
        assert!(detail.recommendations.iter().all(|r| r.product.id != ProductId::new(1)));
        assert_eq!(app.history().views().len(), 1);
    }

    #[tokio::test]
    async fn test_open_missing_product_aborts() {
        let mut app = app();
        let result = app.open_product(ProductId::new(42)).await;
        assert!(matches!(result, Err(ClientError::ProductNotFound(_))));
        assert!(app.history().views().is_empty());
    }

    #[tokio::test]
    async fn test_share_link_and_disabled_sharing() {
        let mut app = app();
        let outcome = app.dispatch(UiAction::Share {
            product_id: ProductId::new(3),
            platform: SharePlatform::Telegram,
        });
        let ActionOutcome::ShareLink(link) = outcome else {
            panic!("expected a link");
        };
        assert!(link.starts_with("https://t.me/share/url?url="));
        assert!(link.contains("shop.example%2Fproduct%2F3"));

        let mut config = config();
        config.disabled_capabilities = BTreeSet::from([Capability::Sharing]);
        let (mut restricted, _) = app_with(config);
        let outcome = restricted.dispatch(UiAction::Share {
            product_id: ProductId::new(3),
            platform: SharePlatform::Vk,
        });
        assert!(matches!(outcome, ActionOutcome::Rejected(_)));
    }

    #[tokio::test]
    async fn test_delivery_from_cart() {
        let mut app = app();
        app.dispatch(UiAction::AddToCart {
            product_id: ProductId::new(3),
            quantity: 1,
        });
        let mut form = app.delivery_form();
        assert_eq!(form.subtotal, Decimal::new(30_000, 0));

        let outcome = app.dispatch(UiAction::CalculateDelivery(form.clone()));
        assert!(matches!(outcome, ActionOutcome::Rejected(_)));

        form.city = "Москва".to_string();
        let ActionOutcome::DeliveryQuote(quote) = app.dispatch(UiAction::CalculateDelivery(form))
        else {
            panic!("expected a quote");
        };
        assert_eq!(quote.zone.rank, 1);
        assert_eq!(quote.methods.len(), 4);
    }

    #[tokio::test]
    async fn test_catalog_load_failure_keeps_snapshot() {
        let mut app = app();
        let mut events = app.context().events().subscribe();
        assert!(app.load_catalog().await.is_err());
        assert_eq!(app.catalog().len(), 5);
        let StoreEvent::Notice(notice) = events.try_recv().unwrap() else {
            panic!("expected a notice");
        };
        assert_eq!(notice.level, crate::events::NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_analytics_to_sink() {
        let (mut app, sink) = app_with(config());
        app.dispatch(UiAction::ToggleCompare(ProductId::new(2)));
        app.shutdown().await;
        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].events[0].name, "compare_add");
    }

    #[tokio::test]
    async fn test_reopening_product_serves_cached_recommendations() {
        let mut app = app();
        let first = app.open_product(ProductId::new(1)).await.unwrap();
        let again = app.open_product(ProductId::new(1)).await.unwrap();
        assert!(Arc::ptr_eq(&first.recommendations, &again.recommendations));

        // a view of a same-category product invalidates the entry
        app.open_product(ProductId::new(2)).await.unwrap();
        let service = app.recommendations.as_ref().unwrap();
        assert!(!service.is_cached(ProductId::new(1)));
        assert!(service.is_cached(ProductId::new(2)));
    }

    #[tokio::test]
    async fn test_disabled_analytics_tracks_nothing() {
        let mut config = config();
        config.disabled_capabilities = BTreeSet::from([Capability::Analytics]);
        let (mut app, _) = app_with(config);
        assert!(app.analytics().is_none());
        assert_eq!(
            app.dispatch(UiAction::AddToCart {
                product_id: ProductId::new(1),
                quantity: 1
            }),
            ActionOutcome::Done
        );
    }
}
