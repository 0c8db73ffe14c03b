use hearth_core::session::{NotificationPreferences, SeenPromotions};
use hearth_core::{PromotionId, SessionId, ViewMode};

use super::StoreContext;
use crate::events::StoreEvent;
use crate::storage::keys;

/// View mode, notification settings, seen promotions and the session id.
pub struct PreferencesStore {
    view_mode: ViewMode,
    notifications: NotificationPreferences,
    seen_promotions: SeenPromotions,
    session_id: SessionId,
    ctx: StoreContext,
}

impl PreferencesStore {
    /// Load preferences, creating and persisting a session id on first use.
    #[must_use]
    pub fn load(ctx: StoreContext) -> Self {
        let stored: Option<SessionId> = ctx.load(keys::SESSION_ID);
        let session_id = stored.unwrap_or_else(|| {
            let fresh = SessionId::generate();
            ctx.persist(keys::SESSION_ID, &fresh);
            fresh
        });
        Self {
            view_mode: ctx.load(keys::VIEW_MODE),
            notifications: ctx.load(keys::NOTIFICATION_PREFS),
            seen_promotions: ctx.load(keys::SEEN_PROMOTIONS),
            session_id,
            ctx,
        }
    }

    #[must_use]
    pub const fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub const fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        self.ctx.persist(keys::VIEW_MODE, &self.view_mode);
        self.ctx.publish(StoreEvent::ViewModeChanged(mode));
    }

    /// Switch between grid and list. Returns the new mode.
    pub fn toggle_view_mode(&mut self) -> ViewMode {
        let mode = self.view_mode.toggled();
        self.set_view_mode(mode);
        mode
    }

    #[must_use]
    pub const fn notifications(&self) -> NotificationPreferences {
        self.notifications
    }

    pub fn set_notifications(&mut self, prefs: NotificationPreferences) {
        self.notifications = prefs;
        self.ctx.persist(keys::NOTIFICATION_PREFS, &self.notifications);
        self.ctx.publish(StoreEvent::PreferencesChanged);
    }

    #[must_use]
    pub const fn seen_promotions(&self) -> &SeenPromotions {
        &self.seen_promotions
    }

    /// Mark promotions as shown; persists only when something was new.
    pub fn mark_promotions_seen(&mut self, ids: impl IntoIterator<Item = PromotionId>) {
        let mut changed = false;
        for id in ids {
            changed |= self.seen_promotions.mark_seen(id);
        }
        if changed {
            self.ctx.persist(keys::SEEN_PROMOTIONS, &self.seen_promotions);
        }
    }
}
