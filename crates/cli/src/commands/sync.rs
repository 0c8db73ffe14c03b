//! One-shot catalog sync from the configured source.
//!
//! Reads the same `CATALOG_*` variables as the storefront.

use hearth_storefront::config::CatalogConfig;
use hearth_storefront::sync::{CatalogSync, source};
use tracing::info;

use super::connect;

/// Run one catalog sync.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the source fails or the
/// import is refused.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let config = CatalogConfig::from_env()?;

    let sync = CatalogSync::new(source::from_config(&config));
    info!(source = sync.source().name(), "Starting catalog sync");

    let report = sync.run(&pool).await?;
    info!(
        received = report.received,
        imported = report.imported,
        skipped = report.skipped,
        "Catalog sync finished"
    );
    Ok(())
}
