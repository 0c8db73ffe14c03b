//! Delivery tariff storage.

use hearth_core::delivery::RateTable;
use sqlx::PgPool;
use sqlx::types::Json;

use super::RepositoryError;

pub struct RateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RateRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The stored tariff, or the built-in one when none is stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored JSON is not a rate table.
    pub async fn current(&self) -> Result<RateTable, RepositoryError> {
        let stored: Option<Json<serde_json::Value>> =
            sqlx::query_scalar("SELECT rates FROM catalog.delivery_rates WHERE id = 1")
                .fetch_optional(self.pool)
                .await?;

        match stored {
            Some(Json(value)) => serde_json::from_value(value)
                .map_err(|e| RepositoryError::DataCorruption(format!("delivery rates: {e}"))),
            None => Ok(RateTable::default()),
        }
    }

    /// Store `table` as the tariff.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set(&self, table: &RateTable) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO catalog.delivery_rates (id, rates) VALUES (1, $1) \
             ON CONFLICT (id) DO UPDATE SET rates = EXCLUDED.rates, updated_at = NOW()",
        )
        .bind(Json(table))
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
