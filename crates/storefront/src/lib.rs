//! Hearth storefront library.
//!
//! Catalog server for the Hearth heating-equipment shop: a server-rendered
//! catalog page, the JSON API the offline-capable client talks to, an admin
//! API and the catalog sync job. The binary in `main.rs` wires it to a
//! listener; tests drive [`app`] directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod sync;

use axum::Router;
use axum::extract::Request;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so
/// rate limiting and view logging see the peer address.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
