//! Retry schedule: items waiting out their backoff delay.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tokio::time::Instant;

use crate::domain::ItemId;

/// Scheduled retry entry.
///
/// Ordering is reversed so `BinaryHeap` acts as a min-heap (earliest first).
/// Ties fall back to scheduling order, which keeps retries that come due
/// together in the order they failed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledRetry {
    due_at: Instant,
    seq: u64,
    item_id: ItemId,
}

impl PartialOrd for ScheduledRetry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledRetry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_at
            .cmp(&self.due_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
pub struct RetrySchedule {
    heap: BinaryHeap<ScheduledRetry>,
    next_seq: u64,
}

impl RetrySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, item_id: ItemId, due_at: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(ScheduledRetry {
            due_at,
            seq,
            item_id,
        });
    }

    /// Pop every entry due at or before `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<ItemId> {
        let mut due = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if entry.due_at > now {
                break; // Heap is sorted, so we can stop
            }
            if let Some(entry) = self.heap.pop() {
                due.push(entry.item_id);
            }
        }
        due
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.heap.peek().map(|entry| entry.due_at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
