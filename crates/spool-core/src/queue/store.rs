//! Priority store: three FIFO tiers of item IDs.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::domain::{ItemId, Priority};

/// Per-tier queue sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSizes {
    pub high: usize,
    pub normal: usize,
    pub low: usize,
}

impl TierSizes {
    pub fn total(&self) -> usize {
        self.high + self.normal + self.low
    }
}

/// Queued items ordered by priority, FIFO within a tier.
///
/// Holds IDs only; the item records live in the manager state.
#[derive(Debug, Default)]
pub struct PriorityStore {
    tiers: [VecDeque<ItemId>; 3],
}

impl PriorityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail of the item's tier.
    pub fn enqueue(&mut self, id: ItemId, priority: Priority) {
        self.tiers[priority.index()].push_back(id);
    }

    /// Pop the head of the highest-priority non-empty tier.
    pub fn dequeue_next(&mut self) -> Option<(ItemId, Priority)> {
        Priority::ALL
            .iter()
            .find_map(|&p| self.tiers[p.index()].pop_front().map(|id| (id, p)))
    }

    /// Remove a specific item (cancellation). O(n) in the tier length.
    pub fn remove(&mut self, id: ItemId, priority: Priority) -> bool {
        let tier = &mut self.tiers[priority.index()];
        match tier.iter().position(|queued| *queued == id) {
            Some(pos) => tier.remove(pos).is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(VecDeque::is_empty)
    }

    pub fn len_by_tier(&self) -> TierSizes {
        TierSizes {
            high: self.tiers[Priority::High.index()].len(),
            normal: self.tiers[Priority::Normal.index()].len(),
            low: self.tiers[Priority::Low.index()].len(),
        }
    }
}
