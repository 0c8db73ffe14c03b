//! Analytics ingest and the admin analytics summary.

use chrono::{DateTime, Duration, Utc};
use hearth_core::ProductId;
use hearth_core::analytics::AnalyticsBatch;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use super::{RepositoryError, start_of_day};

/// Products listed in the summary's top-viewed table.
const TOP_PRODUCTS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct TopProduct {
    pub id: ProductId,
    pub name: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CategoryViews {
    pub category: String,
    pub views: i64,
}

/// View statistics for the admin analytics page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub total_views: i64,
    pub today_views: i64,
    pub week_views: i64,
    pub top_products: Vec<TopProduct>,
    pub category_views: Vec<CategoryViews>,
}

#[derive(FromRow)]
struct ViewCounts {
    total_views: i64,
    today_views: i64,
    week_views: i64,
}

/// Repository for client analytics.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a batch of events in one transaction. Returns the number stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// stored in that case.
    #[instrument(skip_all, fields(events = batch.events.len()))]
    pub async fn insert_batch(&self, batch: &AnalyticsBatch) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for event in &batch.events {
            sqlx::query(
                "INSERT INTO catalog.analytics_event (name, session_id, occurred_at, attributes) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(&event.name)
            .bind(event.session_id.as_str())
            .bind(event.timestamp)
            .bind(Json(&event.attributes))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(batch.events.len())
    }

    /// Totals, today/week counts, top products and per-category views.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn summary(&self, now: DateTime<Utc>) -> Result<AnalyticsSummary, RepositoryError> {
        let counts: ViewCounts = sqlx::query_as(
            "SELECT \
                COUNT(*) AS total_views, \
                COUNT(*) FILTER (WHERE viewed_at >= $1) AS today_views, \
                COUNT(*) FILTER (WHERE viewed_at >= $2) AS week_views \
             FROM catalog.product_view",
        )
        .bind(start_of_day(now))
        .bind(now - Duration::days(7))
        .fetch_one(self.pool)
        .await?;

        let top_products = sqlx::query_as(
            "SELECT id, name, views_count AS views FROM catalog.product \
             ORDER BY views_count DESC, id LIMIT $1",
        )
        .bind(TOP_PRODUCTS)
        .fetch_all(self.pool)
        .await?;

        let category_views = sqlx::query_as(
            "SELECT category, COALESCE(SUM(views_count), 0)::BIGINT AS views \
             FROM catalog.product GROUP BY category ORDER BY views DESC, category",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(AnalyticsSummary {
            total_views: counts.total_views,
            today_views: counts.today_views,
            week_views: counts.week_views,
            top_products,
            category_views,
        })
    }
}
