use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use yelpcamp_db::Database;
use yelpcamp_web::session::store::format_timestamp;

/// Background task that purges sessions past their expiry.
pub async fn run_cleanup_loop(db: Arc<Database>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let db = db.clone();
        match tokio::task::spawn_blocking(move || purge_expired(&db, Utc::now())).await {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Cleanup: purged {} expired sessions", count);
                }
            }
            Ok(Err(e)) => warn!("Cleanup error: {:#}", e),
            Err(e) => warn!("Cleanup task failed: {}", e),
        }
    }
}

pub fn purge_expired(db: &Database, now: DateTime<Utc>) -> anyhow::Result<usize> {
    db.delete_expired_sessions(&format_timestamp(now))
}
