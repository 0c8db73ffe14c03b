//! "Frequently viewed together" recommendation engine.
//!
//! For a focal product the engine merges four candidate sources, in this
//! priority order, skipping anything already present:
//!
//! 1. the externally supplied base list (server-computed),
//! 2. products co-viewed with the focal product in the same browsing session,
//! 3. the most viewed in-stock products of the same category (top 4),
//! 4. "trending" products of the same category, boosted ×1.5 when priced
//!    within ±20 % of the focal product (top 3).
//!
//! The merge order decides which candidates survive when sources are
//! abundant. The result never contains the focal product or duplicates and
//! holds at most [`MAX_RECOMMENDATIONS`] entries.

use std::collections::HashSet;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Product};
use crate::session::ViewHistoryEntry;
use crate::types::{ProductId, RecommendationReason};

/// Upper bound on the returned list.
pub const MAX_RECOMMENDATIONS: usize = 8;

/// Same-category candidates appended while the list is shorter than this.
const SIMILAR_LIST_CAP: usize = 8;

/// Trending candidates appended while the list is shorter than this.
const TRENDING_LIST_CAP: usize = 10;

const SIMILAR_TAKE: usize = 4;
const TRENDING_TAKE: usize = 3;

/// Views further apart than this start a new browsing session.
#[must_use]
pub fn session_gap() -> Duration {
    Duration::minutes(30)
}

/// A recommended product and why it was picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product: Product,
    pub reason: RecommendationReason,
}

/// Split a chronological view log into sessions.
///
/// A boundary is inserted wherever consecutive views are more than
/// [`session_gap`] apart.
#[must_use]
pub fn split_sessions(history: &[ViewHistoryEntry]) -> Vec<&[ViewHistoryEntry]> {
    let mut sessions = Vec::new();
    let mut start = 0;
    for (i, pair) in history.windows(2).enumerate() {
        if let [prev, next] = pair
            && next.timestamp - prev.timestamp > session_gap()
        {
            if let Some(session) = history.get(start..=i) {
                sessions.push(session);
            }
            start = i + 1;
        }
    }
    if let Some(rest) = history.get(start..).filter(|rest| !rest.is_empty()) {
        sessions.push(rest);
    }
    sessions
}

/// Distinct products viewed in any session that contains `focal`.
///
/// Order is first appearance in the log; `focal` itself is excluded.
#[must_use]
pub fn co_viewed(focal: ProductId, history: &[ViewHistoryEntry]) -> Vec<ProductId> {
    let mut seen = HashSet::from([focal]);
    let mut ids = Vec::new();
    for session in split_sessions(history) {
        if !session.iter().any(|entry| entry.product_id == focal) {
            continue;
        }
        for entry in session {
            if seen.insert(entry.product_id) {
                ids.push(entry.product_id);
            }
        }
    }
    ids
}

fn same_category<'a>(focal: &'a Product, catalog: &'a Catalog) -> impl Iterator<Item = &'a Product> {
    catalog
        .products()
        .iter()
        .filter(move |p| p.in_stock && p.id != focal.id && p.category == focal.category)
}

/// Most viewed in-stock products of the focal category.
fn similar<'a>(focal: &'a Product, catalog: &'a Catalog) -> Vec<&'a Product> {
    let mut candidates: Vec<&Product> = same_category(focal, catalog).collect();
    candidates.sort_by(|a, b| b.views_count.cmp(&a.views_count));
    candidates.truncate(SIMILAR_TAKE);
    candidates
}

/// Whether `price` is within ±20 % of `reference`.
fn close_in_price(price: Decimal, reference: Decimal) -> bool {
    let tolerance = reference.abs() * Decimal::new(2, 1);
    (price - reference).abs() <= tolerance
}

fn trending_score(candidate: &Product, focal: &Product) -> Decimal {
    let views = Decimal::from(candidate.views_count);
    if close_in_price(candidate.price, focal.price) {
        views * Decimal::new(15, 1)
    } else {
        views
    }
}

/// Same-category products ranked by popularity with a price-proximity boost.
fn trending<'a>(focal: &'a Product, catalog: &'a Catalog) -> Vec<&'a Product> {
    let mut scored: Vec<(Decimal, &Product)> = same_category(focal, catalog)
        .map(|p| (trending_score(p, focal), p))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(TRENDING_TAKE).map(|(_, p)| p).collect()
}

struct Merger {
    seen: HashSet<ProductId>,
    list: Vec<Recommendation>,
}

impl Merger {
    fn new(focal: ProductId) -> Self {
        Self {
            seen: HashSet::from([focal]),
            list: Vec::with_capacity(TRENDING_LIST_CAP),
        }
    }

    fn extend<'a>(
        &mut self,
        candidates: impl IntoIterator<Item = &'a Product>,
        reason: RecommendationReason,
        cap: Option<usize>,
    ) {
        for product in candidates {
            if cap.is_some_and(|cap| self.list.len() >= cap) {
                break;
            }
            if !product.in_stock || !self.seen.insert(product.id) {
                continue;
            }
            self.list.push(Recommendation {
                product: product.clone(),
                reason,
            });
        }
    }
}

/// Build the ranked recommendation list for `focal`.
///
/// Deterministic: identical inputs always give identical output.
#[must_use]
pub fn recommend(
    focal: &Product,
    catalog: &Catalog,
    history: &[ViewHistoryEntry],
    base: &[Product],
) -> Vec<Recommendation> {
    let mut merger = Merger::new(focal.id);

    merger.extend(base, RecommendationReason::Base, None);

    let co_viewed_products = co_viewed(focal.id, history)
        .into_iter()
        .filter_map(|id| catalog.get(id));
    merger.extend(
        co_viewed_products,
        RecommendationReason::CoViewed,
        Some(MAX_RECOMMENDATIONS),
    );

    merger.extend(
        similar(focal, catalog),
        RecommendationReason::Similar,
        Some(SIMILAR_LIST_CAP),
    );
    merger.extend(
        trending(focal, catalog),
        RecommendationReason::Trending,
        Some(TRENDING_LIST_CAP),
    );

    let mut list = merger.list;
    list.truncate(MAX_RECOMMENDATIONS);
    list
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::catalog::tests::product;
    use crate::types::SessionId;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap()
    }

    fn view(id: i32, at: DateTime<Utc>) -> ViewHistoryEntry {
        ViewHistoryEntry {
            product_id: ProductId::new(id),
            timestamp: at,
            session_id: SessionId::parse("s").unwrap(),
        }
    }

    fn ids(list: &[Recommendation]) -> Vec<i32> {
        list.iter().map(|r| r.product.id.as_i32()).collect()
    }

    #[test]
    fn test_session_boundary_after_thirty_minutes() {
        let history = vec![
            view(1, t0()),
            view(2, t0() + Duration::seconds(60)),
            view(3, t0() + Duration::minutes(40)),
        ];
        let sessions = split_sessions(&history);
        assert_eq!(sessions.len(), 2);
        assert_eq!(co_viewed(ProductId::new(1), &history), vec![ProductId::new(2)]);
    }

    #[test]
    fn test_exactly_thirty_minutes_is_same_session() {
        let history = vec![view(1, t0()), view(2, t0() + Duration::minutes(30))];
        assert_eq!(split_sessions(&history).len(), 1);
    }

    #[test]
    fn test_co_viewed_candidate_tagged() {
        // different categories so only the co-view source can produce B
        let catalog = Catalog::new(vec![
            product(1, "meteor", 100, 0),
            product(2, "mk", 100, 0),
            product(3, "laggartt", 100, 0),
        ]);
        let history = vec![
            view(1, t0()),
            view(2, t0() + Duration::seconds(60)),
            view(3, t0() + Duration::minutes(40)),
        ];
        let focal = catalog.get(ProductId::new(1)).unwrap();
        let list = recommend(focal, &catalog, &history, &[]);
        assert_eq!(ids(&list), vec![2]);
        assert_eq!(list[0].reason, RecommendationReason::CoViewed);
    }

    #[test]
    fn test_never_contains_focal_or_duplicates_and_caps_at_eight() {
        let products: Vec<Product> = (1..=20).map(|i| product(i, "meteor", 100, i64::from(i))).collect();
        let catalog = Catalog::new(products.clone());
        let history: Vec<ViewHistoryEntry> = (1..=12)
            .map(|i| view(i, t0() + Duration::seconds(i64::from(i))))
            .collect();
        let focal = catalog.get(ProductId::new(1)).unwrap();
        let base = vec![products[0].clone(), products[4].clone(), products[4].clone()];

        let list = recommend(focal, &catalog, &history, &base);
        assert!(list.len() <= MAX_RECOMMENDATIONS);
        assert!(list.iter().all(|r| r.product.id != focal.id));
        let unique: HashSet<ProductId> = list.iter().map(|r| r.product.id).collect();
        assert_eq!(unique.len(), list.len());
    }

    #[test]
    fn test_merge_order_base_then_co_viewed_then_similar() {
        let catalog = Catalog::new(vec![
            product(1, "meteor", 100, 0),
            product(2, "meteor", 100, 50),
            product(3, "mk", 100, 0),
            product(4, "other", 100, 0),
        ]);
        let history = vec![view(1, t0()), view(3, t0() + Duration::seconds(5))];
        let focal = catalog.get(ProductId::new(1)).unwrap();
        let base = vec![catalog.get(ProductId::new(4)).unwrap().clone()];

        let list = recommend(focal, &catalog, &history, &base);
        assert_eq!(ids(&list), vec![4, 3, 2]);
        let reasons: Vec<RecommendationReason> = list.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![
                RecommendationReason::Base,
                RecommendationReason::CoViewed,
                RecommendationReason::Similar
            ]
        );
    }

    #[test]
    fn test_similar_ranked_by_views_and_limited_to_four() {
        let catalog = Catalog::new(vec![
            product(1, "meteor", 100, 0),
            product(2, "meteor", 100, 10),
            product(3, "meteor", 100, 30),
            product(4, "meteor", 100, 20),
            product(5, "meteor", 100, 50),
            product(6, "meteor", 100, 40),
        ]);
        let focal = catalog.get(ProductId::new(1)).unwrap();
        let similar_ids: Vec<i32> = similar(focal, &catalog).iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(similar_ids, vec![5, 6, 3, 4]);
    }

    #[test]
    fn test_trending_boosts_close_prices() {
        let catalog = Catalog::new(vec![
            product(1, "meteor", 1000, 0),
            // 100 views, far in price -> 100
            product(2, "meteor", 5000, 100),
            // 80 views, within 20 % -> 120
            product(3, "meteor", 1150, 80),
            // 70 views, exactly +20 % -> 105
            product(4, "meteor", 1200, 70),
        ]);
        let focal = catalog.get(ProductId::new(1)).unwrap();
        let trending_ids: Vec<i32> =
            trending(focal, &catalog).iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(trending_ids, vec![3, 4, 2]);
    }

    #[test]
    fn test_out_of_stock_candidates_skipped() {
        let mut sold_out = product(2, "meteor", 100, 99);
        sold_out.in_stock = false;
        let catalog = Catalog::new(vec![product(1, "meteor", 100, 0), sold_out]);
        let history = vec![view(1, t0()), view(2, t0())];
        let focal = catalog.get(ProductId::new(1)).unwrap();
        assert!(recommend(focal, &catalog, &history, &[]).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let products: Vec<Product> = (1..=10).map(|i| product(i, "mk", 100 + i64::from(i), 5)).collect();
        let catalog = Catalog::new(products);
        let focal = catalog.get(ProductId::new(3)).unwrap();
        let first = recommend(focal, &catalog, &[], &[]);
        let second = recommend(focal, &catalog, &[], &[]);
        assert_eq!(first, second);
    }
}
