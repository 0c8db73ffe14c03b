//! Shopper preferences persisted between visits.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Promotion;
use crate::types::PromotionId;

/// Which notifications the shopper wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    /// Show new promotions.
    pub promotions: bool,
    /// Notify when a viewed product gets cheaper.
    pub price_drops: bool,
    /// Browser push notifications; opt-in.
    pub push: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            promotions: true,
            price_drops: true,
            push: false,
        }
    }
}

/// Promotions the shopper has already been shown.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenPromotions {
    ids: BTreeSet<PromotionId>,
}

impl SeenPromotions {
    /// Mark a promotion seen. Returns `false` if it already was.
    pub fn mark_seen(&mut self, id: PromotionId) -> bool {
        self.ids.insert(id)
    }

    #[must_use]
    pub fn is_seen(&self, id: PromotionId) -> bool {
        self.ids.contains(&id)
    }

    /// Promotions active at `now` that have not been shown yet.
    #[must_use]
    pub fn unseen<'a>(&self, promotions: &'a [Promotion], now: DateTime<Utc>) -> Vec<&'a Promotion> {
        promotions
            .iter()
            .filter(|p| p.is_active_at(now) && !self.is_seen(p.id))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn promo(id: i32, active: bool) -> Promotion {
        Promotion {
            id: PromotionId::new(id),
            title: format!("Promo {id}"),
            description: None,
            discount_percentage: None,
            start_date: None,
            end_date: None,
            active,
        }
    }

    #[test]
    fn test_unseen_skips_seen_and_inactive() {
        let promos = vec![promo(1, true), promo(2, true), promo(3, false)];
        let mut seen = SeenPromotions::default();
        assert!(seen.mark_seen(PromotionId::new(1)));
        assert!(!seen.mark_seen(PromotionId::new(1)));

        let unseen = seen.unseen(&promos, Utc::now());
        assert_eq!(unseen.len(), 1);
        assert_eq!(unseen[0].id, PromotionId::new(2));
    }

    #[test]
    fn test_notification_defaults_fill_missing_fields() {
        let prefs: NotificationPreferences = serde_json::from_str(r#"{"push":true}"#).unwrap();
        assert!(prefs.push);
        assert!(prefs.promotions);
        assert!(prefs.price_drops);
    }
}
