//! Delivery calculator form.

use hearth_core::delivery::{DeliveryQuote, RateTable, parse_weight, quote};
use rust_decimal::Decimal;

use crate::error::ValidationError;

/// Form state of the delivery calculator.
///
/// Validation never clears fields; a failed calculation leaves the form as
/// the user typed it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryForm {
    pub city: String,
    /// Weight as typed, e.g. "2,5".
    pub weight: String,
    pub subtotal: Decimal,
}

impl DeliveryForm {
    /// Form pre-filled from the cart.
    #[must_use]
    pub fn for_cart(weight: Decimal, subtotal: Decimal) -> Self {
        Self {
            city: String::new(),
            weight: weight.normalize().to_string(),
            subtotal,
        }
    }

    /// Price every method for the current input.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingCity`] when no city was entered,
    /// [`ValidationError::InvalidSubtotal`] for a negative subtotal.
    pub fn calculate(&self, table: &RateTable) -> Result<DeliveryQuote, ValidationError> {
        let city = self.city.trim();
        if city.is_empty() {
            return Err(ValidationError::MissingCity);
        }
        if self.subtotal < Decimal::ZERO {
            return Err(ValidationError::InvalidSubtotal(self.subtotal.to_string()));
        }
        Ok(quote(city, parse_weight(&self.weight), self.subtotal, table))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hearth_core::delivery::MethodKind;

    use super::*;

    #[test]
    fn test_missing_city_keeps_other_fields() {
        let form = DeliveryForm {
            city: "   ".to_string(),
            weight: "3".to_string(),
            subtotal: Decimal::new(1200, 0),
        };
        assert_eq!(
            form.calculate(&RateTable::default()),
            Err(ValidationError::MissingCity)
        );
        assert_eq!(form.weight, "3");
        assert_eq!(form.subtotal, Decimal::new(1200, 0));
    }

    #[test]
    fn test_unparsable_weight_counts_as_one_kg() {
        let form = DeliveryForm {
            city: "Москва".to_string(),
            weight: "тяжёлый".to_string(),
            subtotal: Decimal::ZERO,
        };
        let quote = form.calculate(&RateTable::default()).unwrap();
        assert_eq!(quote.weight, Decimal::ONE);
        let standard = quote
            .methods
            .iter()
            .find(|m| m.kind == MethodKind::Standard)
            .unwrap();
        assert_eq!(standard.cost, Decimal::new(220, 0));
    }

    #[test]
    fn test_prefill_from_cart() {
        let form = DeliveryForm::for_cart(Decimal::new(2500, 3), Decimal::new(10, 0));
        assert_eq!(form.weight, "2.5");
        assert!(form.city.is_empty());
    }
}
