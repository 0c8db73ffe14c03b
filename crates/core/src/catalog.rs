//! Product catalog model and listing filters.
//!
//! The catalog is owned by the server's database; clients hold an immutable
//! [`Catalog`] snapshot per load and filter it locally.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, PromotionId};

/// Specification key holding the parcel weight in kilograms.
pub const WEIGHT_SPEC_KEY: &str = "weight";

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Supplier article number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Attribute name → value, unique keys in sorted order.
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    pub in_stock: bool,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub views_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// The product price as a typed [`Price`] in rubles.
    ///
    /// Negative amounts coming from a bad import are clamped to zero.
    #[must_use]
    pub fn price(&self) -> Price {
        Price::rubles(self.price.max(Decimal::ZERO)).unwrap_or(Price {
            amount: Decimal::ZERO,
            currency_code: crate::types::CurrencyCode::RUB,
        })
    }

    /// Parcel weight in kilograms, if the specifications carry a usable one.
    #[must_use]
    pub fn weight_kg(&self) -> Option<Decimal> {
        self.specifications
            .get(WEIGHT_SPEC_KEY)
            .and_then(|raw| raw.trim().replace(',', ".").parse::<Decimal>().ok())
            .filter(|w| *w > Decimal::ZERO)
    }

    /// Whether the name or description contains `needle` (case-insensitive).
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// A time-boxed discount campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: PromotionId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub active: bool,
}

impl Promotion {
    /// Whether the promotion runs at `now`. Missing bounds are open.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.start_date.is_none_or(|start| start <= now)
            && self.end_date.is_none_or(|end| now <= end)
    }
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Catalog order.
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    Name,
    Popularity,
}

/// Current listing filter state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub in_stock_only: bool,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl ProductFilter {
    /// Filter with only a category set.
    #[must_use]
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Whether a single product passes every criterion.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty())
            && product.category != category
        {
            return false;
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
            && !product.matches_text(search)
        {
            return false;
        }
        if self.in_stock_only && !product.in_stock {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        true
    }

    /// Apply the filter and sort order to a product list.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let mut matched: Vec<&Product> = products.iter().filter(|p| self.matches(p)).collect();
        match self.sort {
            SortOrder::Default => {}
            SortOrder::PriceAsc => matched.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOrder::PriceDesc => matched.sort_by(|a, b| b.price.cmp(&a.price)),
            SortOrder::Name => matched.sort_by_key(|p| p.name.to_lowercase()),
            SortOrder::Popularity => matched.sort_by(|a, b| b.views_count.cmp(&a.views_count)),
        }
        matched
    }
}

/// An immutable product snapshot with id lookup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a snapshot. Later duplicates of an id are dropped.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let mut index = HashMap::with_capacity(products.len());
        let mut unique = Vec::with_capacity(products.len());
        for product in products {
            if index.contains_key(&product.id) {
                continue;
            }
            index.insert(product.id, unique.len());
            unique.push(product);
        }
        Self {
            products: unique,
            index,
        }
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.index.get(&id).and_then(|&i| self.products.get(i))
    }

    /// All products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Distinct non-empty categories, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .products
            .iter()
            .map(|p| p.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Products matching `filter`, in the filter's sort order.
    #[must_use]
    pub fn filter(&self, filter: &ProductFilter) -> Vec<&Product> {
        filter.apply(&self.products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn product(id: i32, category: &str, price: i64, views: i64) -> Product {
        Product {
            id: ProductId::new(id),
            article: None,
            name: format!("Product {id}"),
            description: String::new(),
            price: Decimal::new(price, 0),
            category: category.to_string(),
            image_url: None,
            specifications: BTreeMap::new(),
            in_stock: true,
            stock_quantity: 1,
            views_count: views,
            updated_at: None,
        }
    }

    #[test]
    fn test_filter_by_category_and_search() {
        let mut boiler = product(1, "meteor", 40_000, 0);
        boiler.name = "METEOR T2 24 H".to_string();
        let products = vec![boiler, product(2, "mk", 30_000, 0)];

        let filter = ProductFilter {
            category: Some("meteor".to_string()),
            search: Some("t2".to_string()),
            ..ProductFilter::default()
        };
        let matched = filter.apply(&products);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, ProductId::new(1));
    }

    #[test]
    fn test_filter_price_bounds_are_inclusive() {
        let products = vec![
            product(1, "mk", 100, 0),
            product(2, "mk", 200, 0),
            product(3, "mk", 300, 0),
        ];
        let filter = ProductFilter {
            min_price: Some(Decimal::new(100, 0)),
            max_price: Some(Decimal::new(200, 0)),
            ..ProductFilter::default()
        };
        let ids: Vec<i32> = filter.apply(&products).iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_filter_in_stock_and_sort() {
        let mut sold_out = product(1, "mk", 100, 5);
        sold_out.in_stock = false;
        let products = vec![sold_out, product(2, "mk", 300, 1), product(3, "mk", 200, 9)];
        let filter = ProductFilter {
            in_stock_only: true,
            sort: SortOrder::PriceDesc,
            ..ProductFilter::default()
        };
        let ids: Vec<i32> = filter.apply(&products).iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_catalog_lookup_and_categories() {
        let catalog = Catalog::new(vec![
            product(1, "mk", 1, 0),
            product(2, "", 1, 0),
            product(3, "meteor", 1, 0),
            product(1, "duplicate", 1, 0),
        ]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(ProductId::new(1)).unwrap().category, "mk");
        assert!(catalog.get(ProductId::new(9)).is_none());
        assert_eq!(catalog.categories(), vec!["meteor", "mk"]);
    }

    #[test]
    fn test_weight_from_specifications() {
        let mut p = product(1, "mk", 1, 0);
        assert!(p.weight_kg().is_none());
        p.specifications.insert(WEIGHT_SPEC_KEY.to_string(), "32,5".to_string());
        assert_eq!(p.weight_kg(), Some(Decimal::new(325, 1)));
    }

    #[test]
    fn test_promotion_window() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut promo = Promotion {
            id: PromotionId::new(1),
            title: "Весна".to_string(),
            description: None,
            discount_percentage: Some(Decimal::new(10, 0)),
            start_date: Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap()),
            active: true,
        };
        assert!(promo.is_active_at(now));
        promo.active = false;
        assert!(!promo.is_active_at(now));
        promo.active = true;
        promo.end_date = Some(Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap());
        assert!(!promo.is_active_at(now));
    }
}
