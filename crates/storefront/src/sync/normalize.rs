//! Turning raw catalog rows into products.
//!
//! Prices and quantities arrive as whatever the spreadsheet held: numbers,
//! `"12 345,50 руб."`, blanks or junk. Junk becomes zero rather than failing
//! the whole import; only rows without a name are dropped.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use hearth_core::PowerLevel;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

use super::source::RawProduct;
use crate::db::NewProduct;

/// Shown when no power rating can be found in the model name.
pub const POWER_UNKNOWN: &str = "Не указана";
pub const DUAL_CIRCUIT: &str = "Двухконтурный";
pub const SINGLE_CIRCUIT: &str = "Одноконтурный";

/// Rated power patterns, tried in order, with the capture group holding kW.
static POWER_PATTERNS: LazyLock<Vec<(Regex, usize)>> = LazyLock::new(|| {
    [
        (r"(T2|M6|M30|B20|B30|C30|C11|Q3)\D*(\d+)", 2),
        (r"(\d+)\s*(C|H|С|Х|КВТ|KW)", 1),
        (r"ГАЗ\s*6000\s*(\d+)", 1),
        (r"MK\s*(\d+)", 1),
        (r"LL1GBQ(\d+)", 1),
        (r"LN1GBQ(\d+)", 1),
    ]
    .into_iter()
    .map(|(pattern, group)| (Regex::new(pattern).expect("Invalid regex"), group))
    .collect()
});

static TWO_OR_THREE_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{2,3})\b").expect("Invalid regex"));

/// Rows in, products out, plus how many rows were dropped.
#[derive(Debug, Default)]
pub struct Normalized {
    pub products: Vec<NewProduct>,
    pub skipped: usize,
}

/// Normalize every row. Rows without a name, and repeats of an article
/// already seen, are skipped.
#[must_use]
pub fn normalize_all(rows: Vec<RawProduct>) -> Normalized {
    let mut seen = HashSet::new();
    let mut out = Normalized::default();
    for row in rows {
        match normalize(row) {
            Some(product) => {
                if let Some(article) = &product.article
                    && !seen.insert(article.clone())
                {
                    out.skipped += 1;
                    continue;
                }
                out.products.push(product);
            }
            None => out.skipped += 1,
        }
    }
    out
}

/// Normalize one row. `None` when the row has no name.
#[must_use]
pub fn normalize(row: RawProduct) -> Option<NewProduct> {
    let name = row.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?.to_string();

    let article = row.article.as_ref().and_then(value_text);
    let price = parse_price(&row.price);
    let stock_quantity = row.stock_quantity.as_ref().map_or(0, parse_quantity);
    let in_stock = row
        .in_stock
        .unwrap_or(row.stock_quantity.is_none() || stock_quantity > 0);

    let category = row
        .category
        .as_deref()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| detect_category(&name).to_string());

    let (power, contours, wifi) = extract_info(&name);
    let power_level = PowerLevel::from_power(&power);

    let mut specifications = parse_specifications(&row.specifications);
    specifications
        .entry("power".to_string())
        .or_insert_with(|| power.clone());
    specifications
        .entry("contours".to_string())
        .or_insert_with(|| contours.to_string());
    specifications
        .entry("wifi".to_string())
        .or_insert_with(|| wifi.to_string());

    let description = row
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("Газовый котел {name}"));
    let image_url = row
        .image_url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| image_for_model(&name).to_string());

    Some(NewProduct {
        article,
        name,
        description,
        price,
        category,
        image_url: Some(image_url),
        specifications,
        in_stock,
        stock_quantity,
        power: Some(power),
        contours: Some(contours.to_string()),
        wifi: Some(wifi.to_string()),
        power_level,
    })
}

fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Parse a price cell. Spaces are thousands separators, `,` is the decimal
/// separator and any other non-digit is dropped. Garbage is zero.
#[must_use]
pub fn parse_price(value: &Value) -> Decimal {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return Decimal::ZERO,
    };
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned
        .trim_matches('.')
        .parse::<Decimal>()
        .ok()
        .filter(|p| *p >= Decimal::ZERO)
        .map_or(Decimal::ZERO, |p| p.round_dp(2))
}

/// Parse a stock cell: truncated to a whole number, negatives and garbage are 0.
#[must_use]
pub fn parse_quantity(value: &Value) -> i32 {
    let parsed = match value {
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        Value::String(s) => s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect::<String>()
            .parse::<Decimal>()
            .ok(),
        _ => None,
    };
    parsed
        .and_then(|q| q.trunc().to_i32())
        .map_or(0, |q| q.max(0))
}

/// Brand category from the model name.
#[must_use]
pub fn detect_category(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.contains("meteor") {
        "meteor"
    } else if lower.contains("laggartt") || lower.contains("газ") {
        "laggartt"
    } else if lower.contains("devotion") {
        "devotion"
    } else if lower.contains("mk") {
        "mk"
    } else {
        "other"
    }
}

/// Rated power, circuit count and Wi-Fi support read off the model name.
#[must_use]
pub fn extract_info(name: &str) -> (String, &'static str, &'static str) {
    let model = name.to_uppercase();

    let power = POWER_PATTERNS
        .iter()
        .find_map(|(re, group)| {
            re.captures(&model)
                .and_then(|caps| caps.get(*group))
                .map(|m| m.as_str().to_string())
        })
        .or_else(|| {
            TWO_OR_THREE_DIGITS
                .captures(&model)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
        .unwrap_or_else(|| POWER_UNKNOWN.to_string());

    let has_any = |markers: &[&str]| markers.iter().any(|m| model.contains(m));
    let contours = if has_any(&[" C", "С ", "C)", "-C", " С "]) {
        DUAL_CIRCUIT
    } else if has_any(&[" H", "Н ", "H)", "-H", " Н "]) {
        SINGLE_CIRCUIT
    } else if model.contains("НАСТЕННЫЙ") {
        DUAL_CIRCUIT
    } else {
        SINGLE_CIRCUIT
    };

    let wifi = if has_any(&["WI-FI", "WIFI", "ВАЙ-ФАЙ", "WI FI"]) {
        "Да"
    } else {
        "Нет"
    };

    (power, contours, wifi)
}

/// Product photo for a model name.
#[must_use]
pub fn image_for_model(name: &str) -> &'static str {
    const METEOR_SERIES: [(&str, &str); 8] = [
        ("METEOR T2", "images/meteor-t2.jpg"),
        ("METEOR C30", "images/meteor-c30.jpg"),
        ("METEOR B30", "images/meteor-b30.jpg"),
        ("METEOR B20", "images/meteor-b20.jpg"),
        ("METEOR C11", "images/meteor-c11.jpg"),
        ("METEOR Q3", "images/meteor-q3.jpg"),
        ("METEOR M30", "images/meteor-m30.jpg"),
        ("METEOR M6", "images/meteor-m6.jpg"),
    ];

    let model = name.to_uppercase();
    if let Some(&(_, image)) = METEOR_SERIES.iter().find(|(series, _)| model.contains(series)) {
        return image;
    }
    if model.contains("LAGGARTT") || model.contains("ГАЗ 6000") {
        "images/laggartt.jpg"
    } else if model.contains("DEVOTION") {
        "images/devotion.jpg"
    } else if model.contains("MK") {
        "images/mk.jpg"
    } else {
        "images/default.jpg"
    }
}

/// Specifications as a JSON object, a JSON string holding one, or
/// `key:value;key:value` text. Anything else is empty.
#[must_use]
pub fn parse_specifications(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.trim().to_string(),
                    Value::Null => return None,
                    other => other.to_string(),
                };
                Some((key.trim().to_string(), text))
            })
            .filter(|(key, _)| !key.is_empty())
            .collect(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.starts_with('{')
                && let Ok(parsed @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed)
            {
                return parse_specifications(&parsed);
            }
            trimmed
                .split(';')
                .filter_map(|pair| pair.split_once(':'))
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .filter(|(key, _)| !key.is_empty())
                .collect()
        }
        _ => BTreeMap::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price(&json!("12 345,50 руб.")), Decimal::new(1_234_550, 2));
        assert_eq!(parse_price(&json!(45990)), Decimal::new(45990, 0));
        assert_eq!(parse_price(&json!("45\u{a0}990")), Decimal::new(45990, 0));
        assert_eq!(parse_price(&json!("по запросу")), Decimal::ZERO);
        assert_eq!(parse_price(&Value::Null), Decimal::ZERO);
    }

    #[test]
    fn test_parse_quantity_clamps_and_truncates() {
        assert_eq!(parse_quantity(&json!("3")), 3);
        assert_eq!(parse_quantity(&json!("2,7")), 2);
        assert_eq!(parse_quantity(&json!(-5)), 0);
        assert_eq!(parse_quantity(&json!("-1")), 0);
        assert_eq!(parse_quantity(&json!("нет")), 0);
        assert_eq!(parse_quantity(&json!(1_000)), 1000);
    }

    #[test]
    fn test_detect_category() {
        assert_eq!(detect_category("Котел METEOR T2 24 C"), "meteor");
        assert_eq!(detect_category("LAGGARTT ГАЗ 6000 24"), "laggartt");
        assert_eq!(detect_category("ГАЗ 6000 12"), "laggartt");
        assert_eq!(detect_category("Devotion LL1GBQ24"), "devotion");
        assert_eq!(detect_category("MK 30"), "mk");
        assert_eq!(detect_category("Baxi"), "other");
    }

    #[test]
    fn test_extract_info() {
        let (power, contours, wifi) = extract_info("METEOR T2 24 C Wi-Fi");
        assert_eq!(power, "24");
        assert_eq!(contours, DUAL_CIRCUIT);
        assert_eq!(wifi, "Да");

        let (power, contours, wifi) = extract_info("MK 30 H");
        assert_eq!(power, "30");
        assert_eq!(contours, SINGLE_CIRCUIT);
        assert_eq!(wifi, "Нет");

        let (power, _, _) = extract_info("DEVOTION LN1GBQ18");
        assert_eq!(power, "18");

        let (power, _, _) = extract_info("Котел напольный");
        assert_eq!(power, POWER_UNKNOWN);
    }

    #[test]
    fn test_image_for_model() {
        assert_eq!(image_for_model("Meteor B30 24"), "images/meteor-b30.jpg");
        assert_eq!(image_for_model("ГАЗ 6000 24"), "images/laggartt.jpg");
        assert_eq!(image_for_model("unknown"), "images/default.jpg");
    }

    #[test]
    fn test_parse_specifications_formats() {
        let specs = parse_specifications(&json!({"weight": 32, "color": "white", "x": null}));
        assert_eq!(specs.get("weight").unwrap(), "32");
        assert_eq!(specs.len(), 2);

        let specs = parse_specifications(&json!("weight: 32,5; color:белый;broken"));
        assert_eq!(specs.get("weight").unwrap(), "32,5");
        assert_eq!(specs.get("color").unwrap(), "белый");
        assert_eq!(specs.len(), 2);

        let specs = parse_specifications(&json!(r#"{"weight": "30"}"#));
        assert_eq!(specs.get("weight").unwrap(), "30");
    }

    #[test]
    fn test_normalize_fills_derived_fields() {
        let row: RawProduct = serde_json::from_value(json!({
            "Артикул": 10024,
            "Модель": "METEOR T2 24 C",
            "Цена": "45 990,00",
            "В_наличии": "0"
        }))
        .unwrap();
        let product = normalize(row).unwrap();
        assert_eq!(product.article.as_deref(), Some("10024"));
        assert_eq!(product.category, "meteor");
        assert_eq!(product.price, Decimal::new(45990, 0));
        assert!(!product.in_stock);
        assert_eq!(product.power_level, PowerLevel::Medium);
        assert_eq!(product.description, "Газовый котел METEOR T2 24 C");
        assert_eq!(product.image_url.as_deref(), Some("images/meteor-t2.jpg"));
        assert_eq!(product.specifications.get("power").unwrap(), "24");
    }

    #[test]
    fn test_normalize_keeps_explicit_values() {
        let row: RawProduct = serde_json::from_value(json!({
            "name": "Boiler X",
            "price": 1000,
            "category": "Premium",
            "description": "Custom",
            "specifications": {"power": "40"}
        }))
        .unwrap();
        let product = normalize(row).unwrap();
        assert_eq!(product.category, "premium");
        assert_eq!(product.description, "Custom");
        assert!(product.in_stock);
        assert_eq!(product.specifications.get("power").unwrap(), "40");
    }

    #[test]
    fn test_normalize_all_skips_nameless_and_duplicate_articles() {
        let rows = vec![
            serde_json::from_value(json!({"article": "A1", "name": "MK 24"})).unwrap(),
            serde_json::from_value(json!({"article": "A1", "name": "MK 24 copy"})).unwrap(),
            serde_json::from_value(json!({"article": "A2", "name": "  "})).unwrap(),
            serde_json::from_value(json!({"name": "MK 30"})).unwrap(),
        ];
        let normalized = normalize_all(rows);
        assert_eq!(normalized.products.len(), 2);
        assert_eq!(normalized.skipped, 2);
    }
}
