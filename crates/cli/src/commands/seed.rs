//! Seed a fresh database: catalog from a JSON file, the built-in delivery
//! tariff and a sample promotion.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use hearth_core::delivery::RateTable;
use hearth_storefront::db::{NewPromotion, PromotionRepository, RateRepository};
use hearth_storefront::sync::{CatalogSync, JsonFileSource};
use rust_decimal::Decimal;
use tracing::info;

use super::connect;

/// Options for `hearth-cli seed`.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// `{"products": [...]}` document to import.
    pub products: PathBuf,
    /// Leave the promotion table alone.
    pub skip_promotions: bool,
}

/// Import the catalog and reference data.
///
/// # Errors
///
/// Returns an error if the file cannot be read or imported, or a database
/// write fails.
pub async fn run(options: &SeedOptions) -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;

    info!(path = %options.products.display(), "Importing catalog");
    let sync = CatalogSync::new(Arc::new(JsonFileSource::new(options.products.clone())));
    let report = sync.run(&pool).await?;
    info!(
        received = report.received,
        imported = report.imported,
        skipped = report.skipped,
        "Catalog imported"
    );

    RateRepository::new(&pool).set(&RateTable::default()).await?;
    info!("Delivery rates set to the built-in tariff");

    if options.skip_promotions {
        return Ok(());
    }

    let promotions = PromotionRepository::new(&pool);
    if promotions.list().await?.is_empty() {
        let created = promotions.create(&sample_promotion()).await?;
        info!(promotion_id = %created.id, title = %created.title, "Sample promotion created");
    } else {
        info!("Promotions already present, none added");
    }

    Ok(())
}

/// A 30-day discount starting now.
fn sample_promotion() -> NewPromotion {
    let now = Utc::now();
    NewPromotion {
        title: "Скидка на котлы".to_string(),
        description: Some("Скидка 10% на газовые котлы в течение месяца".to_string()),
        discount_percentage: Some(Decimal::new(10, 0)),
        start_date: Some(now),
        end_date: Some(now + Duration::days(30)),
        active: true,
    }
}
