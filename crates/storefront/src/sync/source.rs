//! Where catalog rows come from.
//!
//! Both sources read the same document shape:
//!
//! ```json
//! {"products": [{"article": "MT-24", "name": "METEOR T2 24 C", "price": "45 990", "stock_quantity": 3}]}
//! ```
//!
//! Spreadsheet exports with Russian column names (`Артикул`, `Модель`, `Цена`,
//! `В_наличии`) are accepted as aliases.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::CatalogConfig;

/// Errors raised while reading a catalog source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid catalog document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A catalog row as delivered by the source, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
    /// Supplier article; spreadsheets sometimes deliver it as a number.
    #[serde(default, alias = "Артикул")]
    pub article: Option<Value>,
    #[serde(default, alias = "model", alias = "Модель")]
    pub name: Option<String>,
    #[serde(default, alias = "Цена")]
    pub price: Value,
    #[serde(default, alias = "quantity", alias = "stock", alias = "В_наличии")]
    pub stock_quantity: Option<Value>,
    #[serde(default, alias = "Категория")]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "Фото")]
    pub image_url: Option<String>,
    /// JSON object, JSON string or `key:value;key:value` text.
    #[serde(default)]
    pub specifications: Value,
    #[serde(default)]
    pub in_stock: Option<bool>,
}

/// `{"products": [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub products: Vec<RawProduct>,
}

/// A source of raw catalog rows.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Read every row.
    async fn fetch(&self) -> Result<Vec<RawProduct>, SourceError>;

    /// When the local copy of the data last changed, if there is one.
    async fn last_modified(&self) -> Option<SystemTime>;
}

/// Pick the source configured in `config`: the HTTP feed when a URL is set,
/// otherwise the JSON file.
#[must_use]
pub fn from_config(config: &CatalogConfig) -> Arc<dyn CatalogSource> {
    match &config.feed_url {
        Some(url) => Arc::new(
            HttpFeedSource::new(url.clone(), config.feed_token.clone())
                .with_snapshot(config.json_path.clone()),
        ),
        None => Arc::new(JsonFileSource::new(config.json_path.clone())),
    }
}

async fn modified_at(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

/// Reads `{"products": [...]}` from a file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-file"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<Vec<RawProduct>, SourceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let document: CatalogDocument = serde_json::from_slice(&bytes)?;
        debug!(rows = document.products.len(), "Read catalog file");
        Ok(document.products)
    }

    async fn last_modified(&self) -> Option<SystemTime> {
        modified_at(&self.path).await
    }
}

const FEED_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the catalog document over HTTP.
///
/// Implements `Debug` manually to redact the bearer token.
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: Url,
    token: Option<SecretString>,
    snapshot: Option<PathBuf>,
}

impl std::fmt::Debug for HttpFeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFeedSource")
            .field("url", &self.url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl HttpFeedSource {
    #[must_use]
    pub fn new(url: Url, token: Option<SecretString>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FEED_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url,
            token,
            snapshot: None,
        }
    }

    /// Also write each fetched document to `path`, so the file source and the
    /// freshness check see the last good copy.
    #[must_use]
    pub fn with_snapshot(mut self, path: PathBuf) -> Self {
        self.snapshot = Some(path);
        self
    }

    async fn write_snapshot(&self, path: &Path, body: &[u8]) {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
            && let Err(e) = tokio::fs::create_dir_all(dir).await
        {
            warn!(error = %e, path = %dir.display(), "Failed to create snapshot directory");
            return;
        }
        if let Err(e) = tokio::fs::write(path, body).await {
            warn!(error = %e, path = %path.display(), "Failed to write catalog snapshot");
        }
    }
}

#[async_trait]
impl CatalogSource for HttpFeedSource {
    fn name(&self) -> &str {
        "http-feed"
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<RawProduct>, SourceError> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header("Accept", "application/json")
            .header("User-Agent", "Hearth/1.0");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status,
                body: body.chars().take(200).collect(),
            });
        }

        let body = response.bytes().await?;
        let document: CatalogDocument = serde_json::from_slice(&body)?;
        debug!(rows = document.products.len(), "Fetched catalog feed");

        if let Some(path) = &self.snapshot {
            self.write_snapshot(path, &body).await;
        }
        Ok(document.products)
    }

    async fn last_modified(&self) -> Option<SystemTime> {
        match &self.snapshot {
            Some(path) => modified_at(path).await,
            None => None,
        }
    }
}
