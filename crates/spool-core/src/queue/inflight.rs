//! In-flight tracker: items holding a concurrency slot, with their deadlines.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::ItemId;

/// Monotonic timing of one processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlightEntry {
    /// Attempt number the item was dispatched with.
    pub attempt: u32,
    pub started: Instant,
    pub deadline: Instant,
}

impl InFlightEntry {
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }
}

/// Bounded set of processing items.
///
/// The bound itself is enforced by the caller (the manager checks
/// `has_capacity` before inserting); this type only tracks membership and
/// deadlines.
#[derive(Debug)]
pub struct InFlight {
    entries: HashMap<ItemId, InFlightEntry>,
    capacity: usize,
}

impl InFlight {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.entries.len() < self.capacity
    }

    pub fn insert(&mut self, id: ItemId, attempt: u32, started: Instant, timeout: Duration) {
        debug_assert!(self.has_capacity(), "in-flight set over capacity");
        self.entries.insert(
            id,
            InFlightEntry {
                attempt,
                started,
                deadline: started + timeout,
            },
        );
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<InFlightEntry> {
        self.entries.remove(id)
    }

    /// Remove the entry only if it belongs to `attempt`. An answer for an
    /// earlier attempt leaves the current one in place.
    pub fn remove_attempt(&mut self, id: &ItemId, attempt: u32) -> Option<InFlightEntry> {
        match self.entries.get(id) {
            Some(entry) if entry.attempt == attempt => self.entries.remove(id),
            _ => None,
        }
    }

    pub fn attempt(&self, id: &ItemId) -> Option<u32> {
        self.entries.get(id).map(|entry| entry.attempt)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// IDs whose deadline has passed, oldest deadline first.
    pub fn expired(&self, now: Instant) -> Vec<ItemId> {
        let mut overdue: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(id, entry)| (entry.deadline, *id))
            .collect();
        overdue.sort();
        overdue.into_iter().map(|(_, id)| id).collect()
    }
}
