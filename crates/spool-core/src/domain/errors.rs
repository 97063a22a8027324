//! Queue error taxonomy.

use std::time::Duration;

use thiserror::Error;

use super::ids::ItemId;

/// Errors produced by the queue manager.
///
/// Admission errors (`QueueFull`, `RateLimitExceeded`, `InvalidPriority`) are
/// returned synchronously and never change queue state. Processing failures are
/// data, not errors: they end up in an item's `last_error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("queue is full (max_queue_size={max})")]
    QueueFull { max: usize },

    #[error("rate limit exceeded ({limit} admissions per second)")]
    RateLimitExceeded { limit: u32 },

    #[error("invalid priority '{0}' (expected high, normal or low)")]
    InvalidPriority(String),

    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// Synthetic failure injected by the timeout sweep.
    #[error("processing timeout after {}ms", .timeout.as_millis())]
    ProcessingTimeout { timeout: Duration },

    #[error("admission limiter failed: {0}")]
    Limiter(String),

    #[error("dispatch channel closed")]
    DispatchClosed,
}

impl QueueError {
    /// Is this an admission rejection the caller can retry later?
    pub fn is_admission_rejection(&self) -> bool {
        matches!(
            self,
            QueueError::QueueFull { .. } | QueueError::RateLimitExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_is_in_millis() {
        let err = QueueError::ProcessingTimeout {
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "processing timeout after 30000ms");
    }

    #[test]
    fn admission_rejections_are_classified() {
        assert!(QueueError::QueueFull { max: 2 }.is_admission_rejection());
        assert!(QueueError::RateLimitExceeded { limit: 10 }.is_admission_rejection());
        assert!(!QueueError::InvalidPriority("x".into()).is_admission_rejection());
    }
}
