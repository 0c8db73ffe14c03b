//! Offline cart snapshots.

use hearth_core::wire::CartSnapshot;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{debug, instrument};

use super::RepositoryError;

pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a snapshot unless a newer one for the same session is already
    /// stored. Returns whether this snapshot was kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip_all, fields(session_id = %snapshot.session_id))]
    pub async fn save(&self, snapshot: &CartSnapshot) -> Result<bool, RepositoryError> {
        let stored = sqlx::query(
            "INSERT INTO catalog.cart_snapshot (session_id, items, captured_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (session_id) DO UPDATE SET \
                items = EXCLUDED.items, \
                captured_at = EXCLUDED.captured_at, \
                updated_at = NOW() \
             WHERE cart_snapshot.captured_at < EXCLUDED.captured_at",
        )
        .bind(snapshot.session_id.as_str())
        .bind(Json(&snapshot.items))
        .bind(snapshot.captured_at)
        .execute(self.pool)
        .await?
        .rows_affected()
            > 0;

        if !stored {
            debug!("Ignoring stale cart snapshot");
        }
        Ok(stored)
    }
}
