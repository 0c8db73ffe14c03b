//! Product view log.

use chrono::{DateTime, Utc};
use hearth_core::{ProductId, SessionId};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::RepositoryError;

/// Request metadata stored with a product view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewView {
    pub session_id: Option<SessionId>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// One view in a session's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct SessionView {
    pub product_id: ProductId,
    pub viewed_at: DateTime<Utc>,
}

/// Repository for the product view log.
pub struct ViewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ViewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Views recorded for `session`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_session(&self, session: &SessionId) -> Result<Vec<SessionView>, RepositoryError> {
        let views = sqlx::query_as(
            "SELECT product_id, viewed_at FROM catalog.product_view \
             WHERE session_id = $1 ORDER BY viewed_at, id",
        )
        .bind(session.as_str())
        .fetch_all(self.pool)
        .await?;
        Ok(views)
    }
}
