//! Offline delivery quote against the built-in tariff.

use std::fmt::Write as _;

use hearth_core::delivery::{DeliveryQuote, RateTable, parse_weight, quote};
use hearth_core::{CurrencyCode, format_amount};
use rust_decimal::Decimal;

/// Quote every method for `city` and print a table.
pub fn quote_command(city: &str, weight: &str, subtotal: Decimal) {
    let result = quote(city, parse_weight(weight), subtotal, &RateTable::default());

    #[allow(clippy::print_stdout)]
    {
        print!("{}", render(&result));
    }
}

fn render(quote: &DeliveryQuote) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Zone: {} (x{}), weight {} kg",
        quote.zone.name, quote.zone.modifier, quote.weight
    );

    let cheapest = quote.cheapest().map(|m| m.kind);
    for method in &quote.methods {
        let cost = if method.is_free {
            "free".to_string()
        } else {
            format_amount(method.cost, CurrencyCode::RUB)
        };
        let marker = if Some(method.kind) == cheapest { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {:<24} {:>12}  {}",
            method.name, cost, method.time_label
        );
    }

    if !quote.threshold_reached {
        let _ = writeln!(
            out,
            "Add {} more for the free-delivery discount",
            format_amount(quote.amount_to_threshold, CurrencyCode::RUB)
        );
    }
    out
}
