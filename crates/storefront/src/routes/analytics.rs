//! Session view history and analytics ingest.

use axum::Json;
use axum::extract::State;
use hearth_core::analytics::{AnalyticsBatch, MAX_BATCH_EVENTS};
use hearth_core::wire::Accepted;
use tracing::instrument;

use crate::db::{AnalyticsRepository, ViewRepository};
use crate::db::views::SessionView;
use crate::error::{AppError, Result};
use crate::middleware::RequireSession;
use crate::state::AppState;

/// Product views recorded for the caller's session, oldest first.
#[instrument(skip_all, fields(session = %session))]
pub async fn views(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> Result<Json<Vec<SessionView>>> {
    let views = ViewRepository::new(state.pool())
        .for_session(&session)
        .await?;
    Ok(Json(views))
}

/// Store a batch of client analytics events.
#[instrument(skip_all, fields(events = batch.events.len()))]
pub async fn ingest(
    State(state): State<AppState>,
    Json(batch): Json<AnalyticsBatch>,
) -> Result<Json<Accepted>> {
    if batch.events.len() > MAX_BATCH_EVENTS {
        return Err(AppError::BadRequest(format!(
            "batch holds {} events, at most {MAX_BATCH_EVENTS} allowed",
            batch.events.len()
        )));
    }
    if batch.events.is_empty() {
        return Ok(Json(Accepted { accepted: 0 }));
    }

    let accepted = AnalyticsRepository::new(state.pool())
        .insert_batch(&batch)
        .await?;
    tracing::debug!(accepted, "Analytics batch stored");
    Ok(Json(Accepted { accepted }))
}
