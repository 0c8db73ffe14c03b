//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HEARTH_API_BASE_URL` - Base URL of the storefront API (e.g. `http://127.0.0.1:3000/`)
//!
//! ## Optional
//! - `HEARTH_STATE_DIR` - Directory for persisted client state (in-memory when unset)
//! - `HEARTH_ANALYTICS_FLUSH_SECS` - Analytics flush interval (default: 30)
//! - `HEARTH_ANALYTICS_BATCH_SIZE` - Queued events that trigger a flush (default: 10)
//! - `HEARTH_SHARE_BASE_URL` - Public product URL base for share links (default: API base)
//! - `HEARTH_DISABLED_CAPABILITIES` - Comma-separated features to switch off (e.g. `analytics,sharing`)

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::capabilities::Capability;

const DEFAULT_FLUSH_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Storefront API base URL
    pub api_base_url: Url,
    /// Where stores persist their state; `None` keeps state in memory
    pub state_dir: Option<PathBuf>,
    /// Periodic analytics flush interval
    pub analytics_flush_interval: Duration,
    /// Queue length that triggers an immediate analytics flush
    pub analytics_batch_size: usize,
    /// Base for public product links used in share URLs
    pub share_base_url: Url,
    /// Optional features switched off for this client
    pub disabled_capabilities: BTreeSet<Capability>,
}

impl ClientConfig {
    /// Defaults for everything but the API URL.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            share_base_url: api_base_url.clone(),
            api_base_url,
            state_dir: None,
            analytics_flush_interval: Duration::from_secs(DEFAULT_FLUSH_SECS),
            analytics_batch_size: hearth_core::analytics::DEFAULT_BATCH_SIZE,
            disabled_capabilities: BTreeSet::new(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let api_base_url = parse_url("HEARTH_API_BASE_URL", &get_required_env("HEARTH_API_BASE_URL")?)?;
        let share_base_url = match get_optional_env("HEARTH_SHARE_BASE_URL") {
            Some(raw) => parse_url("HEARTH_SHARE_BASE_URL", &raw)?,
            None => api_base_url.clone(),
        };
        let flush_secs = parse_env_or_default("HEARTH_ANALYTICS_FLUSH_SECS", DEFAULT_FLUSH_SECS)?;
        let analytics_batch_size = parse_env_or_default(
            "HEARTH_ANALYTICS_BATCH_SIZE",
            hearth_core::analytics::DEFAULT_BATCH_SIZE,
        )?;

        Ok(Self {
            api_base_url,
            state_dir: get_optional_env("HEARTH_STATE_DIR").map(PathBuf::from),
            analytics_flush_interval: Duration::from_secs(flush_secs.max(1)),
            analytics_batch_size: analytics_batch_size.max(1),
            share_base_url,
            disabled_capabilities: parse_capabilities(
                &get_optional_env("HEARTH_DISABLED_CAPABILITIES").unwrap_or_default(),
            )?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn parse_capabilities(raw: &str) -> Result<BTreeSet<Capability>, ConfigError> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.parse::<Capability>().map_err(|e| {
                ConfigError::InvalidEnvVar("HEARTH_DISABLED_CAPABILITIES".to_string(), e)
            })
        })
        .collect()
}

/// Parse a base URL, making sure it ends in `/` so relative joins keep its path.
fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
