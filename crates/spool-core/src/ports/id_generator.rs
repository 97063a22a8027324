//! IdGenerator port - item ID allocation.
//!
//! # Implementations
//! - **UlidGenerator**: ULID from a Clock timestamp plus random bits

use crate::domain::ItemId;
use crate::ports::Clock;
use ulid::Ulid;

pub trait IdGenerator: Send + Sync {
    fn generate_item_id(&self) -> ItemId;
}

/// ULID generator driven by a Clock, so tests with a FixedClock get a
/// deterministic timestamp component.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_item_id(&self) -> ItemId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        ItemId::from(ulid)
    }
}
