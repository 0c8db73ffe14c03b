//! Session extractors.
//!
//! Clients identify their browsing session with the `x-session-id` header.
//! There is no server-side session store.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use hearth_core::SessionId;
use hearth_core::wire::SESSION_HEADER;

use crate::error::AppError;

fn session_from(parts: &Parts) -> Option<SessionId> {
    parts
        .headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(SessionId::parse)
}

/// Extractor that requires a session header.
///
/// Rejects with 400 when the header is missing or blank.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireSession(session): RequireSession) -> String {
///     session.to_string()
/// }
/// ```
pub struct RequireSession(pub SessionId);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_from(parts)
            .map(Self)
            .ok_or_else(|| AppError::BadRequest("No session found".to_string()))
    }
}

/// Extractor for the session header when present.
pub struct OptionalSession(pub Option<SessionId>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_from(parts)))
    }
}
