//! DispatchSink port - hands dispatched items to the worker side.
//!
//! Dispatch is fire-and-forget: `dispatch` must not wait for the worker. The
//! worker reports back through `QueueManager::complete_processing` /
//! `fail_processing`.

use crate::domain::{QueueError, QueueItem};

pub trait DispatchSink: Send + Sync {
    fn dispatch(&self, item: QueueItem) -> Result<(), QueueError>;
}
