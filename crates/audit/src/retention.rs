use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::store::AuditStore;

const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Runs `store.delete_older_than` on a daily cadence until `token` fires.
/// Audit failures here never affect the user-facing response since this
/// task is entirely decoupled from request handling.
pub fn spawn_retention_sweep(store: Arc<dyn AuditStore>, retention_days: i64, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(SWEEP_INTERVAL) => {
                    let cutoff = Utc::now() - ChronoDuration::days(retention_days);
                    match store.delete_older_than(cutoff) {
                        Ok(deleted) => tracing::info!(deleted, retention_days, "audit retention sweep completed"),
                        Err(error) => tracing::warn!(%error, "audit retention sweep failed"),
                    }
                }
                _ = token.cancelled() => {
                    tracing::info!("audit retention sweep stopped");
                    break;
                }
            }
        }
    })
}
