//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Catalog prices are never negative.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rubles, not kopecks).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal, currency_code: CurrencyCode) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self {
            amount,
            currency_code,
        })
    }

    /// Create a price in the default currency (rubles).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn rubles(amount: Decimal) -> Result<Self, PriceError> {
        Self::new(amount, CurrencyCode::RUB)
    }

    /// Format for display with thousands grouping, e.g. `45 990 ₽`.
    ///
    /// Whole amounts drop the fractional part; others keep two digits.
    #[must_use]
    pub fn display(&self) -> String {
        format_amount(self.amount, self.currency_code)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    RUB,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Currency symbol used when formatting amounts.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::RUB => "₽",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }
}

/// Format a bare amount in the given currency.
#[must_use]
pub fn format_amount(amount: Decimal, currency: CurrencyCode) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let whole = rounded.trunc();
    let fraction = (rounded - whole).abs();

    let digits = whole.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.insert(0, '-');
    }

    if fraction.is_zero() {
        format!("{grouped} {}", currency.symbol())
    } else {
        let cents = (fraction * Decimal::ONE_HUNDRED).trunc().normalize().to_string();
        format!("{grouped},{cents:0>2} {}", currency.symbol())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_price_rejected() {
        assert!(matches!(
            Price::rubles(Decimal::new(-1, 0)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::rubles(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_display_groups_thousands() {
        let price = Price::rubles(Decimal::new(45990, 0)).unwrap();
        assert_eq!(price.display(), "45 990 ₽");

        let price = Price::rubles(Decimal::new(123_456_750, 2)).unwrap();
        assert_eq!(price.display(), "1 234 567,50 ₽");
    }

    #[test]
    fn test_display_small_amounts() {
        assert_eq!(format_amount(Decimal::new(999, 0), CurrencyCode::RUB), "999 ₽");
        assert_eq!(format_amount(Decimal::ZERO, CurrencyCode::USD), "0 $");
    }
}
