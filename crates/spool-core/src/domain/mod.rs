//! Domain model (IDs, priorities, item state, errors, decisions).

pub mod decision;
pub mod errors;
pub mod ids;
pub mod item;
pub mod priority;
pub mod request;
pub mod state;

pub use decision::{Decider, Decision, DefaultDecider};
pub use errors::QueueError;
pub use ids::{Id, IdMarker, ItemId, ParseIdError};
pub use item::QueueItem;
pub use priority::Priority;
pub use request::EnqueueRequest;
pub use state::ItemState;
