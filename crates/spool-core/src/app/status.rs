//! Status - point-in-time view of the queue.

use serde::{Deserialize, Serialize};

use crate::queue::{QueueTotals, TierSizes};

/// Snapshot returned by `QueueManager::get_status`.
///
/// Taken under one short critical section (the admission rate is read just
/// after), so it is consistent enough for monitoring but not transactional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub tiers: TierSizes,

    /// Items waiting in any tier.
    pub queued: usize,

    /// Items holding a concurrency slot.
    pub processing: usize,

    /// Failed items waiting out their backoff.
    pub retry_pending: usize,

    pub dlq: usize,

    pub totals: QueueTotals,

    /// Admissions in the last second.
    pub admission_rate: u32,

    /// Rolling mean over recent completions; `None` before the first one.
    pub avg_processing_ms: Option<f64>,
}

impl QueueStatus {
    /// Nothing left to do or wait for, DLQ aside.
    pub fn is_drained(&self) -> bool {
        self.queued == 0 && self.processing == 0 && self.retry_pending == 0
    }
}
