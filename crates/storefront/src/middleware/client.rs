//! Request metadata stored alongside product views.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use super::rate_limit::forwarded_ip;

/// Longest user agent kept; longer values are cut.
const MAX_USER_AGENT_LEN: usize = 512;

/// Caller IP and user agent, when known.
///
/// The IP comes from proxy headers first, then the socket peer address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip_address = forwarded_ip(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .map(|ip| ip.to_string());

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect());

        Ok(Self {
            ip_address,
            user_agent,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[tokio::test]
    async fn test_prefers_forwarded_ip() {
        let (mut parts, ()) = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header(USER_AGENT, "hearth-test/1.0")
            .extension(ConnectInfo(SocketAddr::from(([10, 0, 0, 2], 4000))))
            .body(())
            .unwrap()
            .into_parts();

        let meta = ClientMeta::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(meta.user_agent.as_deref(), Some("hearth-test/1.0"));
    }

    #[tokio::test]
    async fn test_falls_back_to_peer_address() {
        let (mut parts, ()) = Request::builder()
            .extension(ConnectInfo(SocketAddr::from(([10, 0, 0, 2], 4000))))
            .body(())
            .unwrap()
            .into_parts();

        let meta = ClientMeta::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(meta.ip_address.as_deref(), Some("10.0.0.2"));
        assert!(meta.user_agent.is_none());
    }
}
