//! HTTP client for the storefront JSON API.

use std::sync::Arc;

use hearth_core::analytics::AnalyticsBatch;
use hearth_core::catalog::{Product, ProductFilter, Promotion};
use hearth_core::delivery::RateTable;
use hearth_core::wire::{Accepted, CartSnapshot, PushSubscriptionRequest, SESSION_HEADER};
use hearth_core::{ProductId, SessionId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::error::ApiError;

/// Client for the storefront API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session_id: SessionId,
}

impl ApiClient {
    /// Create a client for `base_url` that tags requests with `session_id`.
    #[must_use]
    pub fn new(base_url: Url, session_id: SessionId) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url,
                session_id,
            }),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self
            .inner
            .client
            .get(url)
            .header(SESSION_HEADER, self.inner.session_id.as_str())
            .send()
            .await?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .client
            .post(url)
            .header(SESSION_HEADER, self.inner.session_id.as_str())
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List products, filtered server-side by category and search text.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body does not decode.
    #[instrument(skip(self, filter))]
    pub async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        let mut url = self.endpoint("api/products")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
                query.append_pair("category", category);
            }
            if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
                query.append_pair("search", search.trim());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        let products: Vec<Product> = self.get(url).await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    /// Fetch one product. The server records the view against this session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown ids.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.get(self.endpoint(&format!("api/product/{id}"))?).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.get(self.endpoint("api/categories")?).await
    }

    /// Server-computed base recommendations for a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn recommendations(&self, id: ProductId) -> Result<Vec<Product>, ApiError> {
        self.get(self.endpoint(&format!("api/recommendations/{id}"))?)
            .await
    }

    /// Currently active promotions.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn promotions(&self) -> Result<Vec<Promotion>, ApiError> {
        self.get(self.endpoint("api/promotions")?).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn delivery_rates(&self) -> Result<RateTable, ApiError> {
        self.get(self.endpoint("api/delivery/rates")?).await
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, batch), fields(events = batch.events.len()))]
    pub async fn send_analytics(&self, batch: &AnalyticsBatch) -> Result<Accepted, ApiError> {
        self.post(self.endpoint("api/analytics/events")?, batch)
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn subscribe_push(
        &self,
        subscription: &PushSubscriptionRequest,
    ) -> Result<Accepted, ApiError> {
        self.post(self.endpoint("api/notifications/subscribe")?, subscription)
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, snapshot), fields(lines = snapshot.items.len()))]
    pub async fn sync_cart(&self, snapshot: &CartSnapshot) -> Result<Accepted, ApiError> {
        self.post(self.endpoint("api/cart/sync")?, snapshot).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(response.url().path().to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }
    Ok(response.json::<T>().await?)
}
