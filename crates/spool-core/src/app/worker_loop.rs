//! WorkerGroup - drains the dispatch channel and runs a Processor per item.
//!
//! Each dispatched item runs on its own task in a `JoinSet`; the outcome is
//! reported back through `complete_attempt` / `fail_attempt`, tagged with the
//! attempt the task ran, so a slow answer cannot settle a later attempt. The
//! manager already bounds how many items are in flight, so the group does not
//! limit concurrency itself.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{info, warn};

use crate::domain::QueueItem;
use crate::impls::DispatchReceiver;
use crate::ports::Processor;
use crate::queue::QueueManager;

/// Worker group handle.
/// - `request_shutdown()` stops intake; running items finish and report
/// - `shutdown_and_join()` also waits for them
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WorkerGroup {
    pub fn spawn(
        queue: Arc<QueueManager>,
        rx: DispatchReceiver,
        processor: Arc<dyn Processor>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(worker_loop(queue, rx, processor, shutdown_rx));
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

async fn worker_loop(
    queue: Arc<QueueManager>,
    mut rx: DispatchReceiver,
    processor: Arc<dyn Processor>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut running = JoinSet::new();

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            received = rx.recv() => {
                let Some(item) = received else {
                    // manager dropped
                    break;
                };
                running.spawn(run_one(Arc::clone(&queue), Arc::clone(&processor), item));
            }
            Some(joined) = running.join_next(), if !running.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "processor task panicked");
                }
            }
        }
    }

    info!(running = running.len(), "worker group draining");
    while let Some(joined) = running.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "processor task panicked");
        }
    }
}

async fn run_one(queue: Arc<QueueManager>, processor: Arc<dyn Processor>, item: QueueItem) {
    match processor.process(&item).await {
        Ok(result) => {
            queue.complete_attempt(item.id, item.attempts, result).await;
        }
        Err(error) => {
            queue.fail_attempt(item.id, item.attempts, error).await;
        }
    }
}
