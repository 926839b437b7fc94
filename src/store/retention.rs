//! Retention worker that periodically expires old alerts

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;

use super::alerts::AlertStore;

/// Expires alerts past the store's retention horizon on an interval
pub struct RetentionWorker {
    store: Arc<AlertStore>,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl RetentionWorker {
    pub fn new(store: Arc<AlertStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background worker
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            tracing::info!("Retention worker started with interval {:?}", self.interval);

            let mut interval = time::interval(self.interval);

            while self.running.load(Ordering::SeqCst) {
                interval.tick().await;

                let expired = run_retention_sweep(&self.store);
                if expired > 0 {
                    tracing::info!("Retention worker expired {} alerts", expired);
                }
            }

            tracing::info!("Retention worker stopped");
        })
    }

    /// Stop the worker
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Run one retention sweep (for manual/testing use)
pub fn run_retention_sweep(store: &AlertStore) -> usize {
    let horizon = Utc::now() - chrono::Duration::days(store.config().retention_days);
    store.expire_older_than(horizon)
}
