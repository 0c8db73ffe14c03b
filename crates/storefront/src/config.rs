//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: `http://{host}:{port}`)
//! - `ADMIN_API_TOKEN` - Bearer token for `/admin` endpoints (open when unset)
//! - `CATALOG_JSON_PATH` - Catalog JSON file (default: data/products.json)
//! - `CATALOG_FEED_URL` - HTTP JSON catalog feed; replaces the file source when set
//! - `CATALOG_FEED_TOKEN` - Bearer token sent to the feed
//! - `CATALOG_SYNC_INTERVAL_SECS` - Background sync period (default: 3600, 0 disables)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Bearer token guarding the admin API
    pub admin_token: Option<SecretString>,
    /// Where the catalog comes from and how often it is refreshed
    pub catalog: CatalogConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Catalog source configuration.
///
/// Implements `Debug` manually to redact the feed token.
#[derive(Clone)]
pub struct CatalogConfig {
    /// JSON file with a `{"products": [...]}` document
    pub json_path: PathBuf,
    /// HTTP feed serving the same document
    pub feed_url: Option<Url>,
    /// Bearer token for the feed
    pub feed_token: Option<SecretString>,
    /// Period of the background sync; `None` disables it
    pub sync_interval: Option<Duration>,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("json_path", &self.json_path)
            .field("feed_url", &self.feed_url.as_ref().map(Url::as_str))
            .field(
                "feed_token",
                &self.feed_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("sync_interval", &self.sync_interval)
            .finish()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            json_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            feed_url: None,
            feed_token: None,
            sync_interval: Some(Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS)),
        }
    }
}

const DEFAULT_CATALOG_PATH: &str = "data/products.json";
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 3600;

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_optional_env("STOREFRONT_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            admin_token: get_optional_env("ADMIN_API_TOKEN").map(SecretString::from),
            catalog: CatalogConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CatalogConfig {
    /// Load the catalog settings alone. The CLI uses this for one-shot syncs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let feed_url = get_optional_env("CATALOG_FEED_URL")
            .map(|raw| {
                Url::parse(&raw)
                    .map_err(|e| ConfigError::InvalidEnvVar("CATALOG_FEED_URL".to_string(), e.to_string()))
            })
            .transpose()?;
        let interval_secs: u64 = parse_env(
            "CATALOG_SYNC_INTERVAL_SECS",
            &DEFAULT_SYNC_INTERVAL_SECS.to_string(),
        )?;

        Ok(Self {
            json_path: PathBuf::from(get_env_or_default(
                "CATALOG_JSON_PATH",
                DEFAULT_CATALOG_PATH,
            )),
            feed_url,
            feed_token: get_optional_env("CATALOG_FEED_TOKEN").map(SecretString::from),
            sync_interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` naming `primary_key` when neither is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/hearth"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            admin_token: None,
            catalog: CatalogConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_catalog_defaults() {
        let catalog = CatalogConfig::default();
        assert_eq!(catalog.json_path, PathBuf::from("data/products.json"));
        assert_eq!(catalog.sync_interval, Some(Duration::from_secs(3600)));
        assert!(catalog.feed_url.is_none());
    }

    #[test]
    fn test_catalog_debug_redacts_token() {
        let catalog = CatalogConfig {
            feed_url: Some(Url::parse("https://feed.example/products.json").unwrap()),
            feed_token: Some(SecretString::from("super_secret_feed_token")),
            ..CatalogConfig::default()
        };
        let debug_output = format!("{catalog:?}");
        assert!(debug_output.contains("feed.example"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_feed_token"));
    }

    #[test]
    fn test_parse_env_default() {
        let port: u16 = parse_env("HEARTH_TEST_UNSET_PORT_VARIABLE", "3000").unwrap();
        assert_eq!(port, 3000);
        let bad: Result<u16, _> = parse_env("HEARTH_TEST_UNSET_PORT_VARIABLE", "x");
        assert!(matches!(bad, Err(ConfigError::InvalidEnvVar(_, _))));
    }
}
