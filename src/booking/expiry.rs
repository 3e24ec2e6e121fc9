//! Background sweeper cancelling pending bookings that were never paid

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::store::Store;

/// Cancel unpaid pending bookings older than `ttl`, checking every `every`
pub async fn start_pending_expiry(store: Arc<dyn Store>, ttl: chrono::Duration, every: Duration) {
    let mut interval = interval(every);
    loop {
        interval.tick().await;
        sweep(store.as_ref(), ttl).await;
    }
}

/// One sweep; returns how many bookings were cancelled
pub async fn sweep(store: &dyn Store, ttl: chrono::Duration) -> usize {
    let cutoff = Utc::now() - ttl;
    match store.expire_pending_bookings(cutoff).await {
        Ok(expired) => {
            if !expired.is_empty() {
                info!(count = expired.len(), "Expired unpaid pending bookings: {:?}", expired);
            }
            expired.len()
        }
        Err(e) => {
            warn!("Pending booking sweep failed: {}", e);
            0
        }
    }
}
