//! Client error types.
//!
//! None of these are fatal to the application: each one degrades a single
//! feature. The coordinator turns them into [`Notice`](crate::events::Notice)s
//! or log lines.

use thiserror::Error;

/// Durable storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Storefront API failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout or body decoding failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// The server refused the request itself; sending it again cannot succeed.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                *status >= 400 && *status < 500 && *status != 408 && *status != 429
            }
            _ => false,
        }
    }
}

/// Form input the user has to correct.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Укажите город доставки")]
    MissingCity,
    #[error("Некорректная сумма заказа: {0}")]
    InvalidSubtotal(String),
}

/// Top-level client error.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("cart error: {0}")]
    Cart(#[from] hearth_core::session::CartError),
    #[error("comparison error: {0}")]
    Comparison(#[from] hearth_core::session::ComparisonError),
    #[error("product {0} not found")]
    ProductNotFound(hearth_core::ProductId),
    #[error("capability unavailable: {0}")]
    Unavailable(crate::capabilities::Capability),
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;
