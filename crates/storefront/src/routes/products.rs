//! Catalog JSON API.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use hearth_core::ProductId;
use hearth_core::catalog::{Product, ProductFilter, SortOrder};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::db::{NewView, ProductRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{ClientMeta, OptionalSession};
use crate::state::AppState;

/// Number of same-category products returned as base recommendations.
pub const BASE_RECOMMENDATIONS: i64 = 4;

/// Query parameters for `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub in_stock: bool,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl From<ProductsQuery> for ProductFilter {
    fn from(query: ProductsQuery) -> Self {
        Self {
            category: query.category.filter(|c| !c.trim().is_empty()),
            search: query
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            in_stock_only: query.in_stock,
            min_price: query.min_price,
            max_price: query.max_price,
            sort: query.sort,
        }
    }
}

/// List products matching the query.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = ProductFilter::from(query);
    if let (Some(min), Some(max)) = (filter.min_price, filter.max_price)
        && min > max
    {
        return Err(AppError::BadRequest(
            "min_price must not exceed max_price".to_string(),
        ));
    }

    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// Product detail. Counts the view and logs it with the caller's metadata.
#[instrument(skip(state, session, client), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    OptionalSession(session): OptionalSession,
    client: ClientMeta,
) -> Result<Json<Product>> {
    let view = NewView {
        session_id: session,
        user_agent: client.user_agent,
        ip_address: client.ip_address,
    };

    let product = ProductRepository::new(state.pool())
        .record_view(id, &view)
        .await?;

    let product_id = id.to_string();
    add_breadcrumb(
        "catalog",
        "Viewed product",
        Some(&[("product_id", product_id.as_str())]),
    );
    Ok(Json(product))
}

/// Distinct non-empty categories.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let categories = ProductRepository::new(state.pool()).categories().await?;
    Ok(Json(categories))
}

/// In-stock products from the same category, most viewed first.
///
/// Results are cached per product until the next sync or admin edit.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Product>>> {
    if let Some(cached) = state.recommendation_cache().get(&id).await {
        return Ok(Json(cached.as_ref().clone()));
    }

    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let related = repo.same_category(&product, BASE_RECOMMENDATIONS).await?;

    state
        .recommendation_cache()
        .insert(id, Arc::new(related.clone()))
        .await;
    Ok(Json(related))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_into_filter() {
        let query: ProductsQuery = parse_query(
            "category=%D1%8D%D0%BB%D0%B5%D0%BA%D1%82%D1%80%D0%BE%D0%BA%D0%BE%D1%82%D0%BB%D1%8B&search=%20navien%20&in_stock=true&min_price=1000&sort=price_desc",
        );
        let filter = ProductFilter::from(query);
        assert_eq!(filter.category.as_deref(), Some("электрокотлы"));
        assert_eq!(filter.search.as_deref(), Some("navien"));
        assert!(filter.in_stock_only);
        assert_eq!(filter.min_price, Some(Decimal::new(1000, 0)));
        assert_eq!(filter.max_price, None);
        assert_eq!(filter.sort, SortOrder::PriceDesc);
    }

    #[test]
    fn test_blank_params_are_ignored() {
        let filter = ProductFilter::from(parse_query("category=&search=%20%20"));
        assert_eq!(filter, ProductFilter::default());
    }

    fn parse_query(raw: &str) -> ProductsQuery {
        let uri: axum::http::Uri = format!("/api/products?{raw}").parse().unwrap();
        Query::<ProductsQuery>::try_from_uri(&uri).unwrap().0
    }
}
