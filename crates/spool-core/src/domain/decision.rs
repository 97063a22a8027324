//! Decision model: what happens to an item after a failed attempt.
//!
//! This module defines the Decision type (retry or dead-letter) and the Decider
//! trait (how to pick one from the item's state).

use std::time::Duration;

use super::item::QueueItem;
use crate::queue::RetryPolicy;

/// The next action for a failed item.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Re-enqueue after `delay`.
    Retry { delay: Duration, reason: String },

    /// Park in the DLQ.
    DeadLetter { reason: String },
}

/// Decides retry vs. dead-letter for a failed item.
///
/// Deciders are pure: given the item (attempts already counted for the failed
/// attempt) they return a Decision. Applying it is the manager's job.
pub trait Decider: Send + Sync {
    fn decide(&self, item: &QueueItem) -> Decision;
}

/// Attempt-threshold decider:
/// - Retry if attempts < dlq_threshold, with the delay from the RetryPolicy
/// - Dead-letter if attempts >= dlq_threshold
///
/// A manually retried DLQ item keeps its attempts, so one more failure sends
/// it straight back to the DLQ.
#[derive(Debug, Clone)]
pub struct DefaultDecider {
    retry_policy: RetryPolicy,
    dlq_threshold: u32,
}

impl DefaultDecider {
    pub fn new(retry_policy: RetryPolicy, dlq_threshold: u32) -> Self {
        Self {
            retry_policy,
            dlq_threshold,
        }
    }
}

impl Decider for DefaultDecider {
    fn decide(&self, item: &QueueItem) -> Decision {
        if item.attempts >= self.dlq_threshold {
            Decision::DeadLetter {
                reason: format!(
                    "Max attempts reached: {}/{}",
                    item.attempts, self.dlq_threshold
                ),
            }
        } else {
            let delay = self.retry_policy.next_delay(item.attempts);
            Decision::Retry {
                delay,
                reason: format!(
                    "Retry attempt {}/{} after {:?}",
                    item.attempts + 1,
                    self.dlq_threshold,
                    delay
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemId, Priority};
    use chrono::Utc;
    use rstest::rstest;
    use ulid::Ulid;

    fn item_with_attempts(attempts: u32) -> QueueItem {
        let mut item = QueueItem::new(
            ItemId::from_ulid(Ulid::new()),
            Priority::Normal,
            serde_json::json!({}),
            Utc::now(),
        );
        item.attempts = attempts;
        item
    }

    fn decider() -> DefaultDecider {
        DefaultDecider::new(RetryPolicy::from_millis(&[1000, 5000, 15000]), 3)
    }

    #[rstest]
    #[case(1, 1000)]
    #[case(2, 5000)]
    fn retries_below_threshold(#[case] attempts: u32, #[case] delay_ms: u64) {
        match decider().decide(&item_with_attempts(attempts)) {
            Decision::Retry { delay, .. } => assert_eq!(delay, Duration::from_millis(delay_ms)),
            other => panic!("expected retry, got {other:?}"),
        }
    }

    #[rstest]
    #[case(3)]
    #[case(4)]
    #[case(10)]
    fn dead_letters_at_or_above_threshold(#[case] attempts: u32) {
        let decision = decider().decide(&item_with_attempts(attempts));
        assert!(matches!(decision, Decision::DeadLetter { ref reason } if reason.contains("/3")));
    }

    #[test]
    fn threshold_of_one_never_retries() {
        let decider = DefaultDecider::new(RetryPolicy::from_millis(&[1000]), 1);
        assert!(matches!(
            decider.decide(&item_with_attempts(1)),
            Decision::DeadLetter { .. }
        ));
    }
}
