//! Delivery tariffs and quotes.

use axum::Json;
use axum::extract::State;
use hearth_core::delivery::{DeliveryQuote, RateTable, parse_weight, quote};
use hearth_core::wire::DeliveryQuoteRequest;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::db::RateRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// The stored tariff. Falls back to the built-in one if it cannot be read.
async fn rate_table(state: &AppState) -> RateTable {
    match RateRepository::new(state.pool()).current().await {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("Using built-in delivery rates: {e}");
            RateTable::default()
        }
    }
}

/// Current delivery tariff.
#[instrument(skip(state))]
pub async fn rates(State(state): State<AppState>) -> Json<RateTable> {
    Json(rate_table(&state).await)
}

/// Price every delivery method for a destination.
#[instrument(skip(state), fields(city = %request.city))]
pub async fn quote_delivery(
    State(state): State<AppState>,
    Json(request): Json<DeliveryQuoteRequest>,
) -> Result<Json<DeliveryQuote>> {
    let city = request.city.trim();
    if city.is_empty() {
        return Err(AppError::BadRequest("city is required".to_string()));
    }
    if request.subtotal < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "subtotal cannot be negative".to_string(),
        ));
    }

    let table = rate_table(&state).await;
    let weight = parse_weight(&request.weight);
    Ok(Json(quote(city, weight, request.subtotal, &table)))
}
