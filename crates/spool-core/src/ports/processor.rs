//! Processor port - the work performed for one dispatched item.

use async_trait::async_trait;

use crate::domain::QueueItem;

/// Executes the payload of a dispatched item.
///
/// `Ok` carries an optional result for the completion callback; `Err` carries
/// the failure reason that becomes the item's `last_error`.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, item: &QueueItem) -> Result<Option<serde_json::Value>, String>;
}
