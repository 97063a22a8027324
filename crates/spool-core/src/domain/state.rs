//! Item state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a queue item.
///
/// State transitions:
/// - Queued -> Processing -> Completed
/// - Queued -> Processing -> FailedRetrying -> Queued (while attempts < dlq_threshold)
/// - Queued -> Processing -> DeadLettered (attempts >= dlq_threshold)
/// - DeadLettered -> Queued (manual retry from the DLQ)
/// - Queued -> Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Waiting in a priority tier.
    Queued,

    /// Handed to a worker, holding a concurrency slot.
    Processing,

    /// Finished successfully.
    Completed,

    /// Failed; waiting for its backoff delay before re-entering its tier.
    FailedRetrying,

    /// Retry budget exhausted; parked in the DLQ.
    DeadLettered,

    /// Removed by the caller before dispatch.
    Cancelled,
}

impl ItemState {
    /// Only queued items may be cancelled.
    pub fn is_cancellable(self) -> bool {
        matches!(self, ItemState::Queued)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemState::Queued => "queued",
            ItemState::Processing => "processing",
            ItemState::Completed => "completed",
            ItemState::FailedRetrying => "failed_retrying",
            ItemState::DeadLettered => "dead_lettered",
            ItemState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
