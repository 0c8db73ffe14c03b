//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use hearth_core::{CurrencyCode, format_amount};
use rust_decimal::Decimal;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an amount in rubles with grouped thousands, e.g. `45 990 ₽`.
///
/// Values that are not numbers are rendered unchanged.
///
/// Usage in templates: `{{ product.price|rubles }}`
#[askama::filter_fn]
pub fn rubles(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(raw
        .parse::<Decimal>()
        .map_or(raw, |amount| format_amount(amount, CurrencyCode::RUB)))
}
