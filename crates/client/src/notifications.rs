//! Promotion notices and push subscription.

use chrono::{DateTime, Utc};
use hearth_core::catalog::Promotion;
use hearth_core::session::NotificationPreferences;
use hearth_core::wire::PushSubscriptionRequest;
use serde_json::Value;
use tracing::info;

use crate::api::ApiClient;
use crate::capabilities::{Capability, RequiresCapabilities};
use crate::error::ApiError;
use crate::stores::PreferencesStore;

/// Decides which promotions to announce and remembers what was shown.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    promotions: Vec<Promotion>,
}

impl NotificationCenter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            promotions: Vec::new(),
        }
    }

    /// Replace the known promotion list.
    pub fn set_promotions(&mut self, promotions: Vec<Promotion>) {
        self.promotions = promotions;
    }

    #[must_use]
    pub fn promotions(&self) -> &[Promotion] {
        &self.promotions
    }

    /// Active promotions not shown before, marked seen as they are returned.
    ///
    /// Empty when the shopper turned promotion notices off.
    pub fn take_unseen(
        &self,
        prefs: &mut PreferencesStore,
        now: DateTime<Utc>,
    ) -> Vec<Promotion> {
        if !prefs.notifications().promotions {
            return Vec::new();
        }
        let fresh: Vec<Promotion> = prefs
            .seen_promotions()
            .unseen(&self.promotions, now)
            .into_iter()
            .cloned()
            .collect();
        prefs.mark_promotions_seen(fresh.iter().map(|p| p.id));
        fresh
    }
}

impl RequiresCapabilities for NotificationCenter {
    const REQUIRED: &'static [Capability] = &[Capability::Notifications];
}

/// Register a browser push subscription and turn push notices on.
///
/// # Errors
///
/// Returns `ApiError` if the server rejected the subscription; preferences
/// are left unchanged in that case.
pub async fn subscribe_push(
    api: &ApiClient,
    prefs: &mut PreferencesStore,
    endpoint: &str,
    keys: Value,
) -> Result<(), ApiError> {
    let request = PushSubscriptionRequest {
        endpoint: endpoint.to_string(),
        keys,
    };
    api.subscribe_push(&request).await?;
    prefs.set_notifications(NotificationPreferences {
        push: true,
        ..prefs.notifications()
    });
    info!("Push notifications enabled");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use hearth_core::PromotionId;

    use super::*;
    use crate::events::EventBus;
    use crate::storage::MemoryStorage;
    use crate::stores::StoreContext;

    fn promo(id: i32) -> Promotion {
        Promotion {
            id: PromotionId::new(id),
            title: format!("Скидка {id}"),
            description: None,
            discount_percentage: None,
            start_date: None,
            end_date: None,
            active: true,
        }
    }

    fn prefs() -> PreferencesStore {
        PreferencesStore::load(StoreContext::new(
            Arc::new(MemoryStorage::new()),
            EventBus::new(),
        ))
    }

    #[test]
    fn test_promotions_announced_once() {
        let mut center = NotificationCenter::new();
        center.set_promotions(vec![promo(1), promo(2)]);
        let mut prefs = prefs();

        assert_eq!(center.take_unseen(&mut prefs, Utc::now()).len(), 2);
        assert!(center.take_unseen(&mut prefs, Utc::now()).is_empty());
    }

    #[test]
    fn test_disabled_promotions_stay_unseen() {
        let mut center = NotificationCenter::new();
        center.set_promotions(vec![promo(1)]);
        let mut prefs = prefs();
        prefs.set_notifications(NotificationPreferences {
            promotions: false,
            ..NotificationPreferences::default()
        });
        assert!(center.take_unseen(&mut prefs, Utc::now()).is_empty());
        assert!(!prefs.seen_promotions().is_seen(PromotionId::new(1)));
    }
}
