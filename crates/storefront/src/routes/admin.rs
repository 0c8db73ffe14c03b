//! Admin API: counters, analytics, export and catalog edits.
//!
//! Every handler takes [`AdminAccess`], so the bearer token is checked before
//! anything else runs.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_DISPOSITION;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use hearth_core::ProductId;
use hearth_core::catalog::{Product, ProductFilter, Promotion};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::analytics::AnalyticsSummary;
use crate::db::{
    AnalyticsRepository, CatalogStats, NewPromotion, ProductRepository, ProductUpdate,
    PromotionRepository,
};
use crate::error::{AppError, Result};
use crate::middleware::AdminAccess;
use crate::state::AppState;

/// File name offered for the catalog export download.
pub const EXPORT_FILE_NAME: &str = "products_export.json";

/// Body of `GET /admin/export/products`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogExport {
    pub products: Vec<Product>,
    pub exported_at: DateTime<Utc>,
    pub total_count: usize,
}

/// Body of `DELETE /admin/api/products/{id}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted {
    pub id: ProductId,
    pub views_removed: u64,
}

/// Product and view counters.
#[instrument(skip_all)]
pub async fn stats(_admin: AdminAccess, State(state): State<AppState>) -> Result<Json<CatalogStats>> {
    let stats = ProductRepository::new(state.pool())
        .stats(Utc::now())
        .await?;
    Ok(Json(stats))
}

/// View totals, top products and views by category.
#[instrument(skip_all)]
pub async fn analytics(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<Json<AnalyticsSummary>> {
    let summary = AnalyticsRepository::new(state.pool())
        .summary(Utc::now())
        .await?;
    Ok(Json(summary))
}

/// Whole catalog as a JSON download.
#[instrument(skip_all)]
pub async fn export_products(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let products = ProductRepository::new(state.pool())
        .list(&ProductFilter::default())
        .await?;

    let export = CatalogExport {
        total_count: products.len(),
        products,
        exported_at: Utc::now(),
    };
    tracing::info!(total = export.total_count, "Catalog exported");

    Ok((
        [(
            CONTENT_DISPOSITION,
            format!("attachment; filename={EXPORT_FILE_NAME}"),
        )],
        Json(export),
    ))
}

/// Edit a product. Omitted fields keep their value.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn update_product(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    update
        .validate()
        .map_err(|msg| AppError::BadRequest(msg.to_string()))?;

    let product = ProductRepository::new(state.pool())
        .update(id, &update)
        .await?;
    state.recommendation_cache().invalidate_all();

    tracing::info!("Product updated");
    Ok(Json(product))
}

/// Delete a product together with its view log.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn delete_product(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Deleted>> {
    let views_removed = ProductRepository::new(state.pool()).delete(id).await?;
    state.recommendation_cache().invalidate_all();

    tracing::info!(views_removed, "Product deleted");
    Ok(Json(Deleted { id, views_removed }))
}

/// Every promotion, newest first.
#[instrument(skip_all)]
pub async fn list_promotions(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<Json<Vec<Promotion>>> {
    let promotions = PromotionRepository::new(state.pool()).list().await?;
    Ok(Json(promotions))
}

/// Create a promotion.
#[instrument(skip_all, fields(title = %promotion.title))]
pub async fn create_promotion(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Json(promotion): Json<NewPromotion>,
) -> Result<(StatusCode, Json<Promotion>)> {
    promotion
        .validate()
        .map_err(|msg| AppError::BadRequest(msg.to_string()))?;

    let created = PromotionRepository::new(state.pool())
        .create(&promotion)
        .await?;
    tracing::info!(promotion_id = %created.id, "Promotion created");
    Ok((StatusCode::CREATED, Json(created)))
}
