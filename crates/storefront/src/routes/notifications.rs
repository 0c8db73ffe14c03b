//! Browser push subscriptions.

use axum::Json;
use axum::extract::State;
use hearth_core::wire::{Accepted, PushSubscriptionRequest};
use tracing::instrument;
use url::Url;

use crate::db::SubscriptionRepository;
use crate::error::{AppError, Result};
use crate::middleware::OptionalSession;
use crate::state::AppState;

/// Register a push endpoint, tied to the caller's session when known.
#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Json(subscription): Json<PushSubscriptionRequest>,
) -> Result<Json<Accepted>> {
    validate_endpoint(&subscription.endpoint)?;

    let id = SubscriptionRepository::new(state.pool())
        .upsert(&subscription, session.as_ref())
        .await?;
    tracing::info!(subscription_id = %id, "Push subscription stored");
    Ok(Json(Accepted { accepted: 1 }))
}

/// Push services only hand out HTTPS endpoints.
fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint.trim())
        .map_err(|_| AppError::BadRequest("endpoint must be a URL".to_string()))?;
    if url.scheme() != "https" {
        return Err(AppError::BadRequest(
            "endpoint must use https".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("https://fcm.googleapis.com/fcm/send/abc").is_ok());
        assert!(matches!(
            validate_endpoint("http://push.example/abc"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_endpoint(""),
            Err(AppError::BadRequest(_))
        ));
    }
}
