//! Public promotions endpoint.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use hearth_core::catalog::Promotion;
use tracing::instrument;

use crate::db::PromotionRepository;
use crate::error::Result;
use crate::state::AppState;

/// Promotions running right now.
#[instrument(skip(state))]
pub async fn active(State(state): State<AppState>) -> Result<Json<Vec<Promotion>>> {
    let promotions = PromotionRepository::new(state.pool())
        .active(Utc::now())
        .await?;
    Ok(Json(promotions))
}
