//! ReaperLoop - background timeout sweep and retry promotion.
//!
//! # Flow
//! 1. Every `sweep_interval`: `sweep_timeouts()` fails overdue in-flight items
//! 2. When the earliest retry comes due: `promote_due_retries()`
//! 3. A newly scheduled retry wakes the loop so it can re-arm its timer

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::queue::QueueManager;

pub struct ReaperLoop {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ReaperLoop {
    /// Spawn with the queue's configured sweep interval.
    pub fn spawn(queue: Arc<QueueManager>) -> Self {
        let sweep_interval = queue.config().sweep_interval();
        Self::spawn_with_interval(queue, sweep_interval)
    }

    pub fn spawn_with_interval(queue: Arc<QueueManager>, sweep_interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(reaper_loop(queue, sweep_interval, shutdown_rx));
        Self { shutdown_tx, join }
    }

    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

async fn reaper_loop(
    queue: Arc<QueueManager>,
    sweep_interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(sweep_interval_ms = sweep_interval.as_millis() as u64, "reaper started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let next_retry = queue.next_retry_at().await;
        let retry_due = async {
            match next_retry {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let swept = queue.sweep_timeouts().await;
                if !swept.is_empty() {
                    debug!(count = swept.len(), "timed-out items failed");
                }
            }
            // re-arm the retry timer
            _ = queue.retry_wakeup().notified() => {}
            _ = retry_due => {
                queue.promote_due_retries().await;
            }
        }
    }

    info!("reaper stopped");
}
