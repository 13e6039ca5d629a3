use std::time::Duration;

use log::{error, info};
use tokio::{pin, select, time};
use tokio_postgres::Client;
use tokio_util::sync::CancellationToken;
use tokio_util::task::task_tracker;

use crate::server::controller::DB_TIMEOUT_SECONDS;
use crate::server::database::pool::Pool;

/// night-menu configurations older than this are gone for good
const RETENTION_DAYS: i32 = 30;
const SWEEP_INTERVAL_SECS: u64 = 3600;

async fn worker(cancel_token: CancellationToken, pool: Pool<Client>) {
    let interval = time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
    pin!(interval);
    loop {
        select! {
            _ = interval.tick() => {},
            _ = cancel_token.cancelled() => {
                info!("received cancel signal, returning gracefully");
                return;
            }
        }

        let Some(conn) = pool.acquire(DB_TIMEOUT_SECONDS).await else {
            continue;
        };
        match conn
            .execute(
                "DELETE FROM night_menu WHERE night < CURRENT_DATE - $1::int",
                &[&RETENTION_DAYS],
            )
            .await
        {
            Ok(0) => {}
            Ok(swept) => {
                info!("swept {} stale night-menu rows", swept);
            }
            Err(e) => {
                error!("failed to sweep stale night-menu rows, {}", e);
            }
        };
    }
}

/// Retention sweeper for the per-night menu configuration table.
pub(crate) async fn night_menu_sweeper(cancel_token: CancellationToken, pool: Pool<Client>) {
    let tracker = task_tracker::TaskTracker::new();
    tracker.spawn(worker(cancel_token, pool));
    if tracker.close() {
        tracker.wait().await;
    }
}
