//! Manual catalog sync triggers.

use axum::Json;
use axum::extract::State;
use hearth_core::wire::SyncReport;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::AdminAccess;
use crate::state::AppState;

/// Run a catalog sync now and report what it imported.
///
/// Served at both `/api/load-data` and `/api/sync-data`. A run already in
/// progress answers 409.
#[instrument(skip_all)]
pub async fn trigger(_admin: AdminAccess, State(state): State<AppState>) -> Result<Json<SyncReport>> {
    let report = state.sync_catalog().await?;
    tracing::info!(
        source = state.catalog_sync().source().name(),
        imported = report.imported,
        skipped = report.skipped,
        "Manual catalog sync finished"
    );
    Ok(Json(report))
}
