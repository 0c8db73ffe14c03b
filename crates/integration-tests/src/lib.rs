//! Integration tests for Hearth.
//!
//! # Running Tests
//!
//! ```bash
//! # Client flows against the in-process mock storefront
//! cargo test -p hearth-integration-tests
//!
//! # Smoke tests against a running storefront (needs a migrated, seeded database)
//! STOREFRONT_BASE_URL=http://localhost:3000 cargo test -p hearth-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `client_flows` - The client application end to end over HTTP
//! - `storefront_smoke` - Live storefront API checks
//!
//! The crate itself provides [`MockStorefront`], an in-process axum server
//! speaking the storefront's JSON API and recording every write it receives.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration as ChronoDuration, Utc};
use hearth_core::analytics::{AnalyticsBatch, AnalyticsEvent};
use hearth_core::catalog::{Product, ProductFilter, Promotion};
use hearth_core::delivery::RateTable;
use hearth_core::wire::{Accepted, CartSnapshot, ErrorBody, PushSubscriptionRequest, SESSION_HEADER};
use hearth_core::{ProductId, PromotionId, SessionId};
use rust_decimal::Decimal;
use url::Url;

/// Base recommendations served per product, as the real server does.
const BASE_RECOMMENDATIONS: usize = 4;

/// A product view the mock storefront saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedView {
    pub product_id: ProductId,
    pub session_id: Option<SessionId>,
}

/// Catalog data served by a [`MockStorefront`].
#[derive(Debug, Clone, Default)]
pub struct MockStorefront {
    products: Vec<Product>,
    promotions: Vec<Promotion>,
    rates: RateTable,
}

impl MockStorefront {
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_promotions(mut self, promotions: Vec<Promotion>) -> Self {
        self.promotions = promotions;
        self
    }

    #[must_use]
    pub fn with_rates(mut self, rates: RateTable) -> Self {
        self.rates = rates;
        self
    }

    /// Bind to an ephemeral local port and serve in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(self) -> std::io::Result<RunningStorefront> {
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let shared = Arc::new(Shared {
            data: self,
            available: AtomicBool::new(true),
            recorded: Mutex::new(Recorded::default()),
        });

        let app = Router::new()
            .route("/api/products", get(products))
            .route("/api/product/{id}", get(product_detail))
            .route("/api/categories", get(categories))
            .route("/api/recommendations/{id}", get(recommendations))
            .route("/api/promotions", get(promotions))
            .route("/api/delivery/rates", get(rates))
            .route("/api/analytics/events", post(analytics_events))
            .route("/api/cart/sync", post(cart_sync))
            .route("/api/notifications/subscribe", post(subscribe))
            .with_state(Arc::clone(&shared));

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/"))
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(RunningStorefront { base_url, shared })
    }
}

/// Handle to a mock storefront serving in the background.
#[derive(Clone)]
pub struct RunningStorefront {
    base_url: Url,
    shared: Arc<Shared>,
}

impl RunningStorefront {
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// While unavailable, every write answers 503. Reads keep working.
    pub fn set_available(&self, available: bool) {
        self.shared.available.store(available, Ordering::SeqCst);
    }

    #[must_use]
    pub fn views(&self) -> Vec<RecordedView> {
        lock(&self.shared.recorded).views.clone()
    }

    #[must_use]
    pub fn analytics_events(&self) -> Vec<AnalyticsEvent> {
        lock(&self.shared.recorded)
            .analytics
            .iter()
            .flat_map(|batch| batch.events.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn carts(&self) -> Vec<CartSnapshot> {
        lock(&self.shared.recorded).carts.clone()
    }

    #[must_use]
    pub fn subscriptions(&self) -> Vec<PushSubscriptionRequest> {
        lock(&self.shared.recorded).subscriptions.clone()
    }
}

/// An in-stock product with five units on hand.
#[must_use]
pub fn product(id: i32, name: &str, category: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        article: None,
        name: name.to_string(),
        description: String::new(),
        price: Decimal::new(price, 0),
        category: category.to_string(),
        image_url: None,
        specifications: BTreeMap::from([("weight".to_string(), "30".to_string())]),
        in_stock: true,
        stock_quantity: 5,
        views_count: 0,
        updated_at: None,
    }
}

/// A promotion running from yesterday for a week.
#[must_use]
pub fn promotion(id: i32, title: &str, discount: i64) -> Promotion {
    let now = Utc::now();
    Promotion {
        id: PromotionId::new(id),
        title: title.to_string(),
        description: None,
        discount_percentage: Some(Decimal::new(discount, 0)),
        start_date: Some(now - ChronoDuration::days(1)),
        end_date: Some(now + ChronoDuration::days(7)),
        active: true,
    }
}

/// Poll `condition` every 20 ms for up to two seconds.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

struct Shared {
    data: MockStorefront,
    available: AtomicBool,
    recorded: Mutex<Recorded>,
}

#[derive(Default)]
struct Recorded {
    views: Vec<RecordedView>,
    analytics: Vec<AnalyticsBatch>,
    carts: Vec<CartSnapshot>,
    subscriptions: Vec<PushSubscriptionRequest>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: format!("Not found: {what}"),
        }),
    )
        .into_response()
}

fn unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorBody {
            error: "maintenance".to_string(),
        }),
    )
        .into_response()
}

async fn products(
    State(shared): State<Arc<Shared>>,
    Query(filter): Query<ProductFilter>,
) -> Json<Vec<Product>> {
    Json(filter.apply(&shared.data.products).into_iter().cloned().collect())
}

async fn product_detail(
    State(shared): State<Arc<Shared>>,
    Path(id): Path<ProductId>,
    headers: HeaderMap,
) -> Response {
    let Some(product) = shared.data.products.iter().find(|p| p.id == id) else {
        return not_found(&format!("product {id}"));
    };
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(SessionId::parse);
    lock(&shared.recorded).views.push(RecordedView {
        product_id: id,
        session_id,
    });
    Json(product.clone()).into_response()
}

async fn categories(State(shared): State<Arc<Shared>>) -> Json<Vec<String>> {
    let mut categories: Vec<String> = shared
        .data
        .products
        .iter()
        .map(|p| p.category.clone())
        .filter(|c| !c.is_empty())
        .collect();
    categories.sort();
    categories.dedup();
    Json(categories)
}

async fn recommendations(State(shared): State<Arc<Shared>>, Path(id): Path<ProductId>) -> Response {
    let Some(focal) = shared.data.products.iter().find(|p| p.id == id) else {
        return not_found(&format!("product {id}"));
    };
    let related: Vec<Product> = shared
        .data
        .products
        .iter()
        .filter(|p| p.id != id && p.in_stock && p.category == focal.category)
        .take(BASE_RECOMMENDATIONS)
        .cloned()
        .collect();
    Json(related).into_response()
}

async fn promotions(State(shared): State<Arc<Shared>>) -> Json<Vec<Promotion>> {
    Json(shared.data.promotions.clone())
}

async fn rates(State(shared): State<Arc<Shared>>) -> Json<RateTable> {
    Json(shared.data.rates.clone())
}

async fn analytics_events(
    State(shared): State<Arc<Shared>>,
    Json(batch): Json<AnalyticsBatch>,
) -> Response {
    if !shared.available.load(Ordering::SeqCst) {
        return unavailable();
    }
    let accepted = batch.events.len();
    lock(&shared.recorded).analytics.push(batch);
    Json(Accepted { accepted }).into_response()
}

async fn cart_sync(State(shared): State<Arc<Shared>>, Json(snapshot): Json<CartSnapshot>) -> Response {
    if !shared.available.load(Ordering::SeqCst) {
        return unavailable();
    }
    let accepted = snapshot.items.len();
    lock(&shared.recorded).carts.push(snapshot);
    Json(Accepted { accepted }).into_response()
}

async fn subscribe(
    State(shared): State<Arc<Shared>>,
    Json(subscription): Json<PushSubscriptionRequest>,
) -> Response {
    if !shared.available.load(Ordering::SeqCst) {
        return unavailable();
    }
    lock(&shared.recorded).subscriptions.push(subscription);
    Json(Accepted { accepted: 1 }).into_response()
}
