//! Periodic pull of bookings from the legacy system.

use std::sync::Arc;
use std::time::Duration;

use ortho_sync::{SyncEngine, SyncError};
use tokio_util::sync::CancellationToken;

/// Run a sync pass every `interval` until `cancel` is triggered.
///
/// A pass already started from the admin endpoint makes the scheduled
/// tick a no-op.
pub async fn run(engine: Arc<SyncEngine>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Legacy sync job started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Legacy sync job stopping");
                break;
            }
            _ = ticker.tick() => {
                match engine.run_once(None).await {
                    Ok(report) => {
                        tracing::info!(
                            run_id = report.run_id,
                            status = %report.status,
                            fetched = report.fetched,
                            patients_created = report.patients_created,
                            appointments_created = report.appointments_created,
                            appointments_updated = report.appointments_updated,
                            errors = report.errors,
                            "Legacy sync: pass finished"
                        );
                    }
                    Err(SyncError::AlreadyRunning) => {
                        tracing::debug!("Legacy sync: previous pass still running");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Legacy sync: pass failed");
                    }
                }
            }
        }
    }
}
