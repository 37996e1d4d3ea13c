//! Flags pending payments whose due date has passed.

use std::time::Duration;

use chrono::Utc;
use ortho_db::repositories::PaymentRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often overdue payments are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the overdue sweep loop until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Overdue payment job started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Overdue payment job stopping");
                break;
            }
            _ = interval.tick() => {
                let today = Utc::now().date_naive();
                match PaymentRepo::mark_overdue(&pool, today).await {
                    Ok(0) => tracing::debug!("Overdue sweep: nothing to flag"),
                    Ok(flagged) => tracing::info!(flagged, "Overdue sweep: payments flagged"),
                    Err(e) => tracing::error!(error = %e, "Overdue sweep failed"),
                }
            }
        }
    }
}
