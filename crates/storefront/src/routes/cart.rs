//! Offline cart snapshots.

use axum::Json;
use axum::extract::State;
use hearth_core::wire::{Accepted, CartSnapshot};
use tracing::instrument;

use crate::db::CartRepository;
use crate::error::Result;
use crate::state::AppState;

/// Store the cart a client built while offline.
///
/// A snapshot older than the stored one is acknowledged with `accepted: 0`.
#[instrument(skip_all, fields(session = %snapshot.session_id, items = snapshot.items.len()))]
pub async fn sync(
    State(state): State<AppState>,
    Json(snapshot): Json<CartSnapshot>,
) -> Result<Json<Accepted>> {
    let stored = CartRepository::new(state.pool()).save(&snapshot).await?;
    let accepted = if stored { snapshot.items.len() } else { 0 };
    Ok(Json(Accepted { accepted }))
}
