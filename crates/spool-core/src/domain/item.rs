//! Queue item: the unit of work and its lifecycle record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ItemId;
use super::priority::Priority;
use super::state::ItemState;

/// A unit of work tracked by the queue manager.
///
/// This is the single source of truth for an item's state. Queue structures
/// (tiers, in-flight set, retry schedule, DLQ) hold `ItemId`s only, and every
/// state change goes through the methods below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: ItemId,
    pub priority: Priority,

    /// Opaque to the manager; only the worker interprets it.
    pub payload: serde_json::Value,

    pub state: ItemState,

    /// Number of processing attempts, including the current one while processing.
    pub attempts: u32,

    pub enqueued_at: DateTime<Utc>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    /// When the pending retry is due (FailedRetrying only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_retry_at: Option<DateTime<Utc>>,

    pub last_error: Option<String>,

    /// Result reported with the completion callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl QueueItem {
    pub fn new(
        id: ItemId,
        priority: Priority,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            priority,
            payload,
            state: ItemState::Queued,
            attempts: 0,
            enqueued_at: now,
            processing_started_at: None,
            completed_at: None,
            next_retry_at: None,
            last_error: None,
            result: None,
        }
    }

    /// Dispatch: mark as processing and count the attempt.
    pub fn start_processing(&mut self, now: DateTime<Utc>) {
        self.state = ItemState::Processing;
        self.attempts += 1;
        self.processing_started_at = Some(now);
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>, result: Option<serde_json::Value>) {
        self.state = ItemState::Completed;
        self.completed_at = Some(now);
        self.result = result;
    }

    /// Failed, but another attempt is allowed after the backoff.
    pub fn schedule_retry(&mut self, next_retry_at: DateTime<Utc>, error: String) {
        self.state = ItemState::FailedRetrying;
        self.next_retry_at = Some(next_retry_at);
        self.last_error = Some(error);
    }

    /// Backoff elapsed (or manual retry): back into its tier.
    pub fn requeue(&mut self) {
        self.state = ItemState::Queued;
        self.next_retry_at = None;
    }

    /// Retry budget exhausted.
    pub fn mark_dead_lettered(&mut self, error: String) {
        self.state = ItemState::DeadLettered;
        self.next_retry_at = None;
        self.last_error = Some(error);
    }

    pub fn mark_cancelled(&mut self) {
        self.state = ItemState::Cancelled;
    }
}
