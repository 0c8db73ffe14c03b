//! Background catalog jobs: periodic sync and the data freshness check.

use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{error, info, warn};

use super::Freshness;
use crate::state::AppState;

/// Period of the data freshness check.
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Spawn the job loop. It stops when `shutdown` flips to `true` or its
/// sender is dropped.
///
/// With `sync_interval` unset only the freshness check runs.
pub fn spawn(
    state: AppState,
    sync_interval: Option<Duration>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sync_tick = sync_interval.map(|period| {
            let mut tick = interval_at(Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tick
        });

        let mut health_tick = interval_at(Instant::now(), HEALTH_CHECK_INTERVAL);
        health_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(?sync_interval, "Catalog scheduler started");

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Catalog scheduler stopping");
                        break;
                    }
                }
                () = next_tick(&mut sync_tick) => {
                    info!("Starting scheduled catalog sync");
                    if let Err(e) = state.sync_catalog().await {
                        error!(error = %e, "Scheduled catalog sync failed");
                    }
                }
                _ = health_tick.tick() => {
                    check_freshness(&state).await;
                }
            }
        }
    })
}

/// Wait for the next tick, or forever when the job is disabled.
async fn next_tick(tick: &mut Option<Interval>) {
    match tick {
        Some(tick) => {
            tick.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn check_freshness(state: &AppState) {
    match state.catalog_sync().freshness(SystemTime::now()).await {
        Freshness::Fresh(age) => {
            info!(age_hours = age.as_secs() / 3600, "Catalog data is fresh");
        }
        Freshness::Stale(age) => {
            warn!(age_hours = age.as_secs() / 3600, "Catalog data is stale");
        }
        Freshness::Unknown => {
            warn!(
                source = state.catalog_sync().source().name(),
                "Catalog data age unknown"
            );
        }
    }
}
