//! Queue module: priority tiers, in-flight tracking, retries, dead letters
//! and the manager that ties them together.

mod dead_letter;
mod inflight;
mod manager;
mod metrics;
mod retry;
mod schedule;
mod store;

pub use dead_letter::DeadLetterStore;
pub use inflight::{InFlight, InFlightEntry};
pub use manager::{FailureAction, QueueManager};
pub use metrics::{Metrics, QueueTotals};
pub use retry::RetryPolicy;
pub use schedule::RetrySchedule;
pub use store::{PriorityStore, TierSizes};
