//! Per-shopper collections kept in client-side storage.
//!
//! Every collection upholds its invariants on construction, including when it
//! is deserialized from stored text, so a hand-edited or stale value never
//! produces an invalid cart or comparison set.

mod cart;
mod comparison;
mod history;
mod preferences;

pub use cart::{Cart, CartError, CartItem};
pub use comparison::{ComparisonError, ComparisonSet, MAX_COMPARED};
pub use history::{
    INTENT_LOG_CAP, IntentKind, IntentLog, PurchaseIntent, SEARCH_HISTORY_CAP, SearchHistory,
    VIEW_HISTORY_CAP, ViewHistory, ViewHistoryEntry,
};
pub use preferences::{NotificationPreferences, SeenPromotions};
