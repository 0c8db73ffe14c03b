//! Push subscription storage.

use hearth_core::wire::PushSubscriptionRequest;
use hearth_core::{SessionId, SubscriptionId};
use sqlx::PgPool;
use sqlx::types::Json;

use super::RepositoryError;

pub struct SubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a subscription, refreshing keys when the endpoint is known.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        subscription: &PushSubscriptionRequest,
        session: Option<&SessionId>,
    ) -> Result<SubscriptionId, RepositoryError> {
        let id = sqlx::query_scalar(
            "INSERT INTO catalog.push_subscription (endpoint, keys, session_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (endpoint) DO UPDATE SET \
                keys = EXCLUDED.keys, \
                session_id = COALESCE(EXCLUDED.session_id, push_subscription.session_id) \
             RETURNING id",
        )
        .bind(&subscription.endpoint)
        .bind(Json(&subscription.keys))
        .bind(session.map(SessionId::as_str))
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }
}
