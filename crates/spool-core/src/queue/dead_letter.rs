//! Dead letter store: IDs of items that exhausted their retries.

use std::collections::VecDeque;

use crate::domain::ItemId;

/// DLQ membership in dead-lettering order.
#[derive(Debug, Default)]
pub struct DeadLetterStore {
    ids: VecDeque<ItemId>,
}

impl DeadLetterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: ItemId) {
        self.ids.push_back(id);
    }

    /// Remove one item (manual retry). Returns false if it was not dead-lettered.
    pub fn remove(&mut self, id: &ItemId) -> bool {
        match self.ids.iter().position(|dead| dead == id) {
            Some(pos) => self.ids.remove(pos).is_some(),
            None => false,
        }
    }

    /// Empty the store, returning what was in it.
    pub fn drain(&mut self) -> Vec<ItemId> {
        self.ids.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn keeps_arrival_order_and_removes_by_id() {
        let mut dlq = DeadLetterStore::new();
        let ids: Vec<_> = (0..3).map(|_| ItemId::from_ulid(Ulid::new())).collect();
        for id in &ids {
            dlq.push(*id);
        }

        assert!(dlq.remove(&ids[1]));
        assert!(!dlq.remove(&ids[1]));
        assert_eq!(dlq.iter().copied().collect::<Vec<_>>(), vec![ids[0], ids[2]]);

        assert_eq!(dlq.drain(), vec![ids[0], ids[2]]);
        assert!(dlq.is_empty());
    }
}
