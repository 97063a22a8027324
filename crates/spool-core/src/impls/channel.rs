//! Channel dispatch - DispatchSink backed by a tokio mpsc channel.
//!
//! The channel is unbounded so dispatch never waits. Its occupancy is still
//! bounded: only in-flight items are ever sent, and there are at most
//! `max_concurrent` of those.

use tokio::sync::mpsc;

use crate::domain::{QueueError, QueueItem};
use crate::ports::DispatchSink;

/// Receiving end handed to the worker side.
pub type DispatchReceiver = mpsc::UnboundedReceiver<QueueItem>;

pub fn dispatch_channel() -> (mpsc::UnboundedSender<QueueItem>, DispatchReceiver) {
    mpsc::unbounded_channel()
}

impl DispatchSink for mpsc::UnboundedSender<QueueItem> {
    fn dispatch(&self, item: QueueItem) -> Result<(), QueueError> {
        self.send(item).map_err(|_| QueueError::DispatchClosed)
    }
}
