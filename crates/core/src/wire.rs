//! Request and response bodies shared by the JSON API and its client.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::delivery::DeliveryQuote;
use crate::session::CartItem;
use crate::types::SessionId;

/// Header carrying the client session id.
pub const SESSION_HEADER: &str = "x-session-id";

/// Cart contents pushed by a client that was offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub session_id: SessionId,
    pub items: Vec<CartItem>,
    pub captured_at: DateTime<Utc>,
}

/// Browser push subscription as handed over by the push service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSubscriptionRequest {
    pub endpoint: String,
    #[serde(default)]
    pub keys: Value,
}

/// Body of `POST /api/delivery/quote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryQuoteRequest {
    pub city: String,
    /// Free-text weight; unparsable values count as 1 kg.
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub subtotal: Decimal,
}

/// Body of `POST /api/delivery/quote` responses.
pub type DeliveryQuoteResponse = DeliveryQuote;

/// Generic acknowledgement for ingest endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accepted {
    pub accepted: usize,
}

/// Outcome of one catalog synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Rows read from the source.
    pub received: usize,
    /// Rows written to the catalog.
    pub imported: usize,
    /// Rows dropped during normalization.
    pub skipped: usize,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Error body returned by the JSON API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_request_defaults() {
        let req: DeliveryQuoteRequest = serde_json::from_str(r#"{"city":"Тверь"}"#).unwrap();
        assert_eq!(req.city, "Тверь");
        assert!(req.weight.is_empty());
        assert_eq!(req.subtotal, Decimal::ZERO);
    }
}
