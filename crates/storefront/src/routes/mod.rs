//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Catalog page (server-rendered)
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (database)
//!
//! # Catalog API
//! GET  /api/products                  - Filtered listing
//! GET  /api/product/{id}              - Detail; records a view
//! GET  /api/categories                - Distinct categories
//! GET  /api/recommendations/{id}      - Same-category picks (cached)
//! GET  /api/promotions                - Active promotions
//!
//! # Client ingest
//! GET  /api/analytics/views           - Views for the x-session-id session
//! POST /api/analytics/events          - Analytics batch
//! POST /api/notifications/subscribe   - Push subscription
//! POST /api/cart/sync                 - Offline cart snapshot
//!
//! # Delivery
//! GET  /api/delivery/rates            - Tariff
//! POST /api/delivery/quote            - Quote for a city
//!
//! # Catalog sync (admin token, own rate limit)
//! POST /api/load-data                 - Run a sync
//! POST /api/sync-data                 - Run a sync
//!
//! # Admin (admin token)
//! GET    /admin/api/stats             - Counters
//! GET    /admin/api/analytics         - View analytics
//! GET    /admin/export/products       - JSON export
//! PUT    /admin/api/products/{id}     - Update product
//! DELETE /admin/api/products/{id}     - Delete product and its views
//! GET    /admin/api/promotions        - List promotions
//! POST   /admin/api/promotions        - Create promotion
//! ```

pub mod admin;
pub mod analytics;
pub mod cart;
pub mod delivery;
pub mod health;
pub mod home;
pub mod notifications;
pub mod products;
pub mod promotions;
pub mod sync;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, sync_rate_limiter};
use crate::state::AppState;

/// Create the public JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/product/{id}", get(products::show))
        .route("/categories", get(products::categories))
        .route("/recommendations/{id}", get(products::recommendations))
        .route("/promotions", get(promotions::active))
        .route("/analytics/views", get(analytics::views))
        .route("/analytics/events", post(analytics::ingest))
        .route("/notifications/subscribe", post(notifications::subscribe))
        .route("/delivery/rates", get(delivery::rates))
        .route("/delivery/quote", post(delivery::quote_delivery))
        .route("/cart/sync", post(cart::sync))
        .layer(api_rate_limiter())
}

/// Create the catalog sync trigger router.
pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/load-data", post(sync::trigger))
        .route("/sync-data", post(sync::trigger))
        .layer(sync_rate_limiter())
}

/// Create the admin router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stats", get(admin::stats))
        .route("/api/analytics", get(admin::analytics))
        .route("/export/products", get(admin::export_products))
        .route(
            "/api/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route(
            "/api/promotions",
            get(admin::list_promotions).post(admin::create_promotion),
        )
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes().merge(sync_routes()))
        .nest("/admin", admin_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use hearth_core::ProductId;
    use hearth_core::delivery::{DeliveryQuote, RateTable, parse_weight, quote};
    use hearth_core::wire::{Accepted, ErrorBody, SESSION_HEADER};
    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::{CatalogConfig, StorefrontConfig};
    use crate::state::AppState;

    const ADMIN_TOKEN: &str = "admin-test-token";

    fn state(admin_token: Option<&str>) -> AppState {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://hearth@127.0.0.1:1/hearth"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            admin_token: admin_token.map(SecretString::from),
            catalog: CatalogConfig {
                sync_interval: None,
                ..CatalogConfig::default()
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        // Nothing listens on port 1, so every query fails fast.
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(250))
            .connect_lazy("postgres://hearth@127.0.0.1:1/hearth")
            .unwrap();
        AppState::new(config, pool)
    }

    async fn send(state: AppState, request: Request<Body>) -> Response {
        crate::app(state)
            .layer(axum::Extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40_000)))))
            .oneshot(request)
            .await
            .unwrap()
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(
            state(None),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_readiness_without_database() {
        let response = send(
            state(None),
            Request::get("/health/ready").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_delivery_quote_falls_back_to_builtin_rates() {
        let response = send(
            state(None),
            post_json(
                "/api/delivery/quote",
                r#"{"city":"Москва","weight":"2,5","subtotal":"12000"}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: DeliveryQuote = json(response).await;
        let expected = quote(
            "Москва",
            parse_weight("2,5"),
            Decimal::new(12_000, 0),
            &RateTable::default(),
        );
        assert_eq!(body, expected);
        assert_eq!(body.weight, Decimal::new(25, 1));
    }

    #[tokio::test]
    async fn test_delivery_quote_requires_city() {
        let response = send(state(None), post_json("/api/delivery/quote", r#"{"city":"  "}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = json(response).await;
        assert_eq!(body.error, "Bad request: city is required");
    }

    #[tokio::test]
    async fn test_delivery_rates_fall_back_to_builtin() {
        let response = send(
            state(None),
            Request::get("/api/delivery/rates").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let table: RateTable = json(response).await;
        assert_eq!(table, RateTable::default());
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let response = send(state(None), post_json("/api/analytics/events", "{")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_analytics_batch_is_acknowledged() {
        let response = send(state(None), post_json("/api/analytics/events", r#"{"events":[]}"#)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Accepted = json(response).await;
        assert_eq!(body.accepted, 0);
    }

    #[tokio::test]
    async fn test_session_views_require_session_header() {
        let response = send(
            state(None),
            Request::get("/api/analytics/views").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = json(response).await;
        assert_eq!(body.error, "Bad request: No session found");
    }

    #[tokio::test]
    async fn test_session_views_database_error_is_hidden() {
        let response = send(
            state(None),
            Request::get("/api/analytics/views")
                .header(SESSION_HEADER, "session-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = json(response).await;
        assert_eq!(body.error, "Internal server error");
    }

    #[tokio::test]
    async fn test_inverted_price_range_is_rejected() {
        let response = send(
            state(None),
            Request::get("/api/products?min_price=5000&max_price=100")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recommendations_served_from_cache() {
        let state = state(None);
        state
            .recommendation_cache()
            .insert(ProductId::new(5), Arc::new(Vec::new()))
            .await;

        let response = send(
            state,
            Request::get("/api/recommendations/5").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Vec<hearth_core::catalog::Product> = json(response).await;
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let missing = send(
            state(Some(ADMIN_TOKEN)),
            Request::get("/admin/api/stats").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = send(
            state(Some(ADMIN_TOKEN)),
            Request::get("/admin/api/stats")
                .header(header::AUTHORIZATION, "Bearer nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        let body: ErrorBody = json(wrong).await;
        assert_eq!(body.error, "Unauthorized: invalid admin token");
    }

    #[tokio::test]
    async fn test_sync_trigger_requires_token() {
        let response = send(
            state(Some(ADMIN_TOKEN)),
            Request::post("/api/sync-data").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_promotion_validation_runs_after_auth() {
        let request = Request::post("/admin/api/promotions")
            .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":" "}"#))
            .unwrap();
        let response = send(state(Some(ADMIN_TOKEN)), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = json(response).await;
        assert_eq!(body.error, "Bad request: title cannot be empty");
    }
}
