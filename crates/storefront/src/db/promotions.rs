//! Promotion repository.

use chrono::{DateTime, Utc};
use hearth_core::PromotionId;
use hearth_core::catalog::Promotion;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};

use super::RepositoryError;

const PROMOTION_COLUMNS: &str =
    "id, title, description, discount_percentage, start_date, end_date, active";

#[derive(Debug, FromRow)]
struct PromotionRow {
    id: PromotionId,
    title: String,
    description: Option<String>,
    discount_percentage: Option<Decimal>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    active: bool,
}

impl From<PromotionRow> for Promotion {
    fn from(row: PromotionRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            discount_percentage: row.discount_percentage,
            start_date: row.start_date,
            end_date: row.end_date,
            active: row.active,
        }
    }
}

/// Body of `POST /admin/api/promotions`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPromotion {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl NewPromotion {
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title cannot be empty");
        }
        if self
            .discount_percentage
            .is_some_and(|d| d < Decimal::ZERO || d > Decimal::ONE_HUNDRED)
        {
            return Err("discount_percentage must be between 0 and 100");
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end < start
        {
            return Err("end_date is before start_date");
        }
        Ok(())
    }
}

pub struct PromotionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PromotionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Promotions running at `now`. Missing date bounds are open.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active(&self, now: DateTime<Utc>) -> Result<Vec<Promotion>, RepositoryError> {
        let rows: Vec<PromotionRow> = sqlx::query_as(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM catalog.promotion \
             WHERE active \
               AND (start_date IS NULL OR start_date <= $1) \
               AND (end_date IS NULL OR end_date >= $1) \
             ORDER BY start_date NULLS FIRST, id"
        ))
        .bind(now)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Promotion::from).collect())
    }

    /// Every promotion, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let rows: Vec<PromotionRow> = sqlx::query_as(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM catalog.promotion ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Promotion::from).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, promotion: &NewPromotion) -> Result<Promotion, RepositoryError> {
        let row: PromotionRow = sqlx::query_as(&format!(
            "INSERT INTO catalog.promotion \
                (title, description, discount_percentage, start_date, end_date, active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PROMOTION_COLUMNS}"
        ))
        .bind(promotion.title.trim())
        .bind(promotion.description.as_deref())
        .bind(promotion.discount_percentage)
        .bind(promotion.start_date)
        .bind(promotion.end_date)
        .bind(promotion.active)
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_promotion_defaults_to_active() {
        let promo: NewPromotion = serde_json::from_str(r#"{"title":"Весна"}"#).unwrap();
        assert!(promo.active);
        assert!(promo.validate().is_ok());
    }

    #[test]
    fn test_new_promotion_validation() {
        let promo: NewPromotion = serde_json::from_str(
            r#"{"title":"Весна","discount_percentage":"120"}"#,
        )
        .unwrap();
        assert_eq!(
            promo.validate(),
            Err("discount_percentage must be between 0 and 100")
        );

        let promo: NewPromotion = serde_json::from_str(
            r#"{"title":"Весна","start_date":"2026-03-10T00:00:00Z","end_date":"2026-03-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(promo.validate(), Err("end_date is before start_date"));

        let promo: NewPromotion = serde_json::from_str(r#"{"title":" "}"#).unwrap();
        assert_eq!(promo.validate(), Err("title cannot be empty"));
    }
}
