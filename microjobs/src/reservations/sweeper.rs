//! Background task that periodically expires overdue reservations.

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::ReservationSweeperConfig;

use super::sweep_expired;

/// Run [`sweep_expired`] every `config.interval` until `shutdown` is cancelled.
///
/// Several replicas may run this at once; each job is expired in its own transaction and
/// a second expiry of the same job is a no-op.
pub async fn run_reservation_sweeper(config: ReservationSweeperConfig, pool: PgPool, shutdown: CancellationToken) {
    tracing::info!(interval = ?config.interval, "Starting reservation sweeper");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            _ = shutdown.cancelled() => {
                tracing::info!("Reservation sweeper shutting down");
                return;
            }
        }

        if let Err(e) = sweep_expired(&pool, Utc::now()).await {
            tracing::warn!(error = %e, "Failed to sweep expired reservations");
        }
    }
}
