//! QueueManager - owns every item and every state transition.
//!
//! All mutations go through one async mutex over `QueueState`. Dispatch runs
//! inside that critical section whenever a slot may have opened (admission,
//! completion, failure, timeout, retry promotion, DLQ re-entry), so the
//! in-flight count can never overshoot `max_concurrent`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::{DeadLetterStore, InFlight, InFlightEntry, Metrics, PriorityStore, RetrySchedule};
use crate::app::QueueStatus;
use crate::config::QueueConfig;
use crate::domain::{
    Decider, Decision, EnqueueRequest, ItemId, ItemState, Priority, QueueError, QueueItem,
};
use crate::ports::{AdmissionLimiter, Clock, DispatchSink, IdGenerator};

/// The transition a failed attempt caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Back into its tier after `delay`. `attempt` is the attempt that failed.
    RetryScheduled { attempt: u32, delay: Duration },

    /// Parked in the DLQ.
    DeadLettered { attempts: u32 },
}

impl FailureAction {
    pub fn is_dead_lettered(&self) -> bool {
        matches!(self, FailureAction::DeadLettered { .. })
    }
}

/// Mutable queue state. Tiers, in-flight set, schedule and DLQ hold ids only;
/// `items` is the single source of truth for each item.
struct QueueState {
    items: HashMap<ItemId, QueueItem>,
    store: PriorityStore,
    in_flight: InFlight,
    retries: RetrySchedule,
    dead_letters: DeadLetterStore,
    metrics: Metrics,
}

pub struct QueueManager {
    config: QueueConfig,
    state: Mutex<QueueState>,
    limiter: Arc<dyn AdmissionLimiter>,
    dispatch: Arc<dyn DispatchSink>,
    decider: Arc<dyn Decider>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    retry_wakeup: Notify,
}

impl QueueManager {
    /// Assemble a manager from its collaborators. `config` is assumed valid;
    /// `QueueBuilder` validates it first.
    pub fn new(
        config: QueueConfig,
        limiter: Arc<dyn AdmissionLimiter>,
        dispatch: Arc<dyn DispatchSink>,
        decider: Arc<dyn Decider>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let state = QueueState {
            items: HashMap::new(),
            store: PriorityStore::new(),
            in_flight: InFlight::new(config.max_concurrent),
            retries: RetrySchedule::new(),
            dead_letters: DeadLetterStore::new(),
            metrics: Metrics::new(config.duration_window),
        };
        Self {
            config,
            state: Mutex::new(state),
            limiter,
            dispatch,
            decider,
            clock,
            ids,
            retry_wakeup: Notify::new(),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Admit a new item.
    ///
    /// Capacity is checked before the rate limiter, so a full queue does not
    /// consume rate budget. Rejections leave every queue untouched.
    pub async fn enqueue(
        &self,
        payload: serde_json::Value,
        priority: Priority,
    ) -> Result<QueueItem, QueueError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if let Some(max) = self.config.max_queue_size
            && state.store.len() >= max
        {
            state.metrics.totals.rejected_full += 1;
            warn!(%priority, max, "enqueue rejected: queue full");
            return Err(QueueError::QueueFull { max });
        }

        if !self.limiter.try_acquire().await? {
            state.metrics.totals.rejected_rate += 1;
            let limit = self.limiter.limit();
            warn!(%priority, limit, "enqueue rejected: rate limit exceeded");
            return Err(QueueError::RateLimitExceeded { limit });
        }

        let item = QueueItem::new(
            self.ids.generate_item_id(),
            priority,
            payload,
            self.clock.now(),
        );
        let created = item.clone();
        state.store.enqueue(item.id, priority);
        state.items.insert(item.id, item);
        state.metrics.totals.enqueued += 1;
        info!(item_id = %created.id, %priority, "item enqueued");

        self.pump(state);
        Ok(created)
    }

    /// Admit an item whose priority arrives as a string.
    pub async fn enqueue_request(&self, request: EnqueueRequest) -> Result<QueueItem, QueueError> {
        let priority = request.priority()?;
        self.enqueue(request.payload, priority).await
    }

    pub async fn get_status(&self) -> QueueStatus {
        let status = {
            let state = self.state.lock().await;
            let tiers = state.store.len_by_tier();
            QueueStatus {
                queued: tiers.total(),
                tiers,
                processing: state.in_flight.len(),
                retry_pending: state.retries.len(),
                dlq: state.dead_letters.len(),
                totals: state.metrics.totals,
                admission_rate: 0,
                avg_processing_ms: state
                    .metrics
                    .average_duration()
                    .map(|d| d.as_secs_f64() * 1000.0),
            }
        };
        QueueStatus {
            admission_rate: self.limiter.current_rate().await,
            ..status
        }
    }

    /// Snapshot of a tracked item. Completed and cancelled items are no
    /// longer tracked.
    pub async fn get_item_status(&self, id: ItemId) -> Option<QueueItem> {
        self.state.lock().await.items.get(&id).cloned()
    }

    /// Cancel a queued item.
    ///
    /// `Ok(false)` when the item exists but is not queued (processing, waiting
    /// for a retry, or dead-lettered).
    pub async fn cancel(&self, id: ItemId) -> Result<bool, QueueError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let item = state.items.get(&id).ok_or(QueueError::ItemNotFound(id))?;
        if !item.state.is_cancellable() {
            debug!(item_id = %id, state = %item.state, "cancel refused");
            return Ok(false);
        }

        let priority = item.priority;
        state.store.remove(id, priority);
        if let Some(mut item) = state.items.remove(&id) {
            item.mark_cancelled();
        }
        state.metrics.totals.cancelled += 1;
        info!(item_id = %id, %priority, "item cancelled");
        Ok(true)
    }

    /// Completion callback. Returns the completed item, or `None` when the
    /// item is not in flight (unknown, duplicate or late callback).
    ///
    /// Matches on id alone; workers that know which attempt they ran should
    /// call [`complete_attempt`](Self::complete_attempt).
    pub async fn complete_processing(
        &self,
        id: ItemId,
        result: Option<serde_json::Value>,
    ) -> Option<QueueItem> {
        self.complete_in_flight(id, None, result).await
    }

    /// Completion callback for a specific attempt. An answer from an attempt
    /// the sweep already failed is ignored, even when the item has since been
    /// dispatched again.
    pub async fn complete_attempt(
        &self,
        id: ItemId,
        attempt: u32,
        result: Option<serde_json::Value>,
    ) -> Option<QueueItem> {
        self.complete_in_flight(id, Some(attempt), result).await
    }

    async fn complete_in_flight(
        &self,
        id: ItemId,
        attempt: Option<u32>,
        result: Option<serde_json::Value>,
    ) -> Option<QueueItem> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let entry = Self::take_in_flight(state, id, attempt, "completion")?;
        let elapsed = entry.elapsed(Instant::now());

        let completed = state.items.remove(&id).map(|mut item| {
            item.mark_completed(self.clock.now(), result);
            item
        });
        state.metrics.totals.processed += 1;
        state.metrics.record_duration(elapsed);
        if let Some(item) = &completed {
            info!(
                item_id = %id,
                priority = %item.priority,
                attempt = item.attempts,
                duration_ms = elapsed.as_millis() as u64,
                "item completed"
            );
        }

        self.pump(state);
        completed
    }

    /// Failure callback. Returns the transition taken, or `None` when the
    /// item is not in flight.
    pub async fn fail_processing(
        &self,
        id: ItemId,
        error: impl Into<String>,
    ) -> Option<FailureAction> {
        self.fail_in_flight(id, None, error.into()).await
    }

    /// Failure callback for a specific attempt. Stale attempts are ignored
    /// and do not count as failures.
    pub async fn fail_attempt(
        &self,
        id: ItemId,
        attempt: u32,
        error: impl Into<String>,
    ) -> Option<FailureAction> {
        self.fail_in_flight(id, Some(attempt), error.into()).await
    }

    async fn fail_in_flight(
        &self,
        id: ItemId,
        attempt: Option<u32>,
        error: String,
    ) -> Option<FailureAction> {
        let action = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;

            Self::take_in_flight(state, id, attempt, "failure")?;
            let action = self.handle_failure(state, id, error);
            self.pump(state);
            action
        };

        if matches!(action, Some(FailureAction::RetryScheduled { .. })) {
            self.retry_wakeup.notify_one();
        }
        action
    }

    /// Snapshot of the DLQ, oldest first.
    pub async fn get_dlq_items(&self) -> Vec<QueueItem> {
        let state = self.state.lock().await;
        state
            .dead_letters
            .iter()
            .filter_map(|id| state.items.get(id).cloned())
            .collect()
    }

    /// Move a dead-lettered item back to the tail of its tier, attempts
    /// preserved. `false` if the item is not in the DLQ.
    pub async fn retry_from_dlq(&self, id: ItemId) -> bool {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if !state.dead_letters.remove(&id) {
            return false;
        }
        let Some(item) = state.items.get_mut(&id) else {
            return false;
        };
        item.requeue();
        let priority = item.priority;
        let attempts = item.attempts;
        state.store.enqueue(id, priority);
        info!(item_id = %id, %priority, attempt = attempts, "item re-queued from DLQ");

        self.pump(state);
        true
    }

    /// Drop every dead-lettered item. Returns how many were removed.
    pub async fn clear_dlq(&self) -> usize {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let cleared = state.dead_letters.drain();
        for id in &cleared {
            state.items.remove(id);
        }
        info!(count = cleared.len(), "DLQ cleared");
        cleared.len()
    }

    /// Fail every in-flight item past its deadline with a synthetic timeout
    /// error. Driven by `ReaperLoop` every `sweep_interval`.
    pub async fn sweep_timeouts(&self) -> Vec<(ItemId, FailureAction)> {
        let timeout = self.config.processing_timeout();
        let actions = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;

            let now = Instant::now();
            let mut actions = Vec::new();
            for id in state.in_flight.expired(now) {
                let Some(entry) = state.in_flight.remove(&id) else {
                    continue;
                };
                warn!(
                    item_id = %id,
                    elapsed_ms = entry.elapsed(now).as_millis() as u64,
                    timeout_ms = timeout.as_millis() as u64,
                    "processing timed out"
                );
                let error = QueueError::ProcessingTimeout { timeout }.to_string();
                if let Some(action) = self.handle_failure(state, id, error) {
                    actions.push((id, action));
                }
            }
            if !actions.is_empty() {
                self.pump(state);
            }
            actions
        };

        if actions
            .iter()
            .any(|(_, action)| !action.is_dead_lettered())
        {
            self.retry_wakeup.notify_one();
        }
        actions
    }

    /// Return every item whose backoff has elapsed to the tail of its tier.
    pub async fn promote_due_retries(&self) -> usize {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let mut promoted = 0;
        for id in state.retries.pop_due(Instant::now()) {
            let Some(item) = state.items.get_mut(&id) else {
                continue;
            };
            if item.state != ItemState::FailedRetrying {
                continue;
            }
            item.requeue();
            state.store.enqueue(id, item.priority);
            debug!(item_id = %id, priority = %item.priority, attempt = item.attempts, "retry due, re-queued");
            promoted += 1;
        }

        if promoted > 0 {
            self.pump(state);
        }
        promoted
    }

    /// When the earliest pending retry comes due.
    pub async fn next_retry_at(&self) -> Option<Instant> {
        self.state.lock().await.retries.next_due()
    }

    /// Signalled whenever a retry is scheduled.
    pub fn retry_wakeup(&self) -> &Notify {
        &self.retry_wakeup
    }

    /// Nothing queued, processing or waiting for a retry.
    pub async fn is_idle(&self) -> bool {
        let state = self.state.lock().await;
        state.store.is_empty() && state.in_flight.is_empty() && state.retries.is_empty()
    }

    /// Release the slot a callback refers to. `None` when the item is not in
    /// flight or is running a different attempt than `attempt`.
    fn take_in_flight(
        state: &mut QueueState,
        id: ItemId,
        attempt: Option<u32>,
        callback: &'static str,
    ) -> Option<InFlightEntry> {
        match attempt {
            None => {
                let entry = state.in_flight.remove(&id);
                if entry.is_none() {
                    debug!(item_id = %id, callback, "ignoring callback for item not in flight");
                }
                entry
            }
            Some(attempt) => {
                let entry = state.in_flight.remove_attempt(&id, attempt);
                if entry.is_none() {
                    match state.in_flight.attempt(&id) {
                        Some(current) => warn!(
                            item_id = %id,
                            callback,
                            attempt,
                            current,
                            "ignoring callback from a stale attempt"
                        ),
                        None => debug!(
                            item_id = %id,
                            callback,
                            attempt,
                            "ignoring callback for item not in flight"
                        ),
                    }
                }
                entry
            }
        }
    }

    /// Dispatch from the store while a slot is free.
    fn pump(&self, state: &mut QueueState) {
        let timeout = self.config.processing_timeout();
        while state.in_flight.has_capacity() {
            let Some((id, priority)) = state.store.dequeue_next() else {
                break;
            };
            let Some(item) = state.items.get_mut(&id) else {
                continue;
            };
            item.start_processing(self.clock.now());
            state.in_flight.insert(id, item.attempts, Instant::now(), timeout);
            debug!(item_id = %id, %priority, attempt = item.attempts, "item dispatched");

            // The item stays in flight; the timeout sweep reclaims it.
            if let Err(e) = self.dispatch.dispatch(item.clone()) {
                warn!(item_id = %id, error = %e, "dispatch failed");
            }
        }
    }

    /// Apply the decider's verdict to an item already removed from in-flight.
    fn handle_failure(
        &self,
        state: &mut QueueState,
        id: ItemId,
        error: String,
    ) -> Option<FailureAction> {
        state.metrics.totals.failed += 1;
        let item = state.items.get_mut(&id)?;

        match self.decider.decide(item) {
            Decision::Retry { delay, reason } => {
                let now = self.clock.now();
                let next_retry_at = chrono::Duration::from_std(delay)
                    .ok()
                    .and_then(|d| now.checked_add_signed(d))
                    .unwrap_or(now);
                warn!(
                    item_id = %id,
                    priority = %item.priority,
                    attempt = item.attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    %reason,
                    "attempt failed, retry scheduled"
                );
                item.schedule_retry(next_retry_at, error);
                state.retries.schedule(id, Instant::now() + delay);
                Some(FailureAction::RetryScheduled {
                    attempt: item.attempts,
                    delay,
                })
            }
            Decision::DeadLetter { reason } => {
                error!(
                    item_id = %id,
                    priority = %item.priority,
                    attempt = item.attempts,
                    error = %error,
                    %reason,
                    "item dead-lettered"
                );
                item.mark_dead_lettered(error);
                let attempts = item.attempts;
                state.dead_letters.push(id);
                state.metrics.totals.dead_lettered += 1;
                Some(FailureAction::DeadLettered { attempts })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DefaultDecider;
    use crate::impls::{DispatchReceiver, SlidingWindowLimiter, dispatch_channel};
    use crate::ports::{FixedClock, UlidGenerator};
    use chrono::Utc;
    use serde_json::json;

    fn manager(config: QueueConfig) -> (QueueManager, DispatchReceiver) {
        let (tx, rx) = dispatch_channel();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Utc::now()));
        let manager = QueueManager::new(
            config.clone(),
            Arc::new(SlidingWindowLimiter::per_second(config.rate_limit)),
            Arc::new(tx),
            Arc::new(DefaultDecider::new(
                config.retry_policy(),
                config.dlq_threshold,
            )),
            Arc::clone(&clock),
            Arc::new(UlidGenerator::new(clock)),
        );
        (manager, rx)
    }

    fn config() -> QueueConfig {
        QueueConfig {
            rate_limit: 1000,
            ..QueueConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_dispatches_immediately_when_a_slot_is_free() {
        let (queue, mut rx) = manager(config());
        let created = queue.enqueue(json!({"n": 1}), Priority::High).await.unwrap();
        assert_eq!(created.state, ItemState::Queued);
        assert_eq!(created.attempts, 0);

        let dispatched = rx.recv().await.unwrap();
        assert_eq!(dispatched.id, created.id);
        assert_eq!(dispatched.state, ItemState::Processing);
        assert_eq!(dispatched.attempts, 1);
        assert!(dispatched.processing_started_at.is_some());

        let status = queue.get_status().await;
        assert_eq!(status.processing, 1);
        assert_eq!(status.queued, 0);
        assert_eq!(status.totals.enqueued, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_rejects_without_creating_items() {
        let (queue, _rx) = manager(QueueConfig {
            rate_limit: 2,
            ..QueueConfig::default()
        });
        queue.enqueue(json!({}), Priority::Normal).await.unwrap();
        queue.enqueue(json!({}), Priority::Normal).await.unwrap();

        let err = queue.enqueue(json!({}), Priority::Normal).await.unwrap_err();
        assert_eq!(err, QueueError::RateLimitExceeded { limit: 2 });

        let status = queue.get_status().await;
        assert_eq!(status.totals.enqueued, 2);
        assert_eq!(status.totals.rejected_rate, 1);
        assert_eq!(status.admission_rate, 2);

        tokio::time::advance(Duration::from_secs(1)).await;
        queue.enqueue(json!({}), Priority::Normal).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_request_parses_priority() {
        let (queue, _rx) = manager(config());
        let item = queue
            .enqueue_request(EnqueueRequest::new(json!({})).with_priority("LOW"))
            .await
            .unwrap();
        assert_eq!(item.priority, Priority::Low);

        let err = queue
            .enqueue_request(EnqueueRequest::new(json!({})).with_priority("urgent"))
            .await
            .unwrap_err();
        assert_eq!(err, QueueError::InvalidPriority("urgent".to_string()));
        assert_eq!(queue.get_status().await.totals.enqueued, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_frees_the_slot_and_records_duration() {
        let (queue, mut rx) = manager(QueueConfig {
            max_concurrent: 1,
            ..config()
        });
        let first = queue.enqueue(json!({}), Priority::Normal).await.unwrap();
        let second = queue.enqueue(json!({}), Priority::Normal).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().id, first.id);
        assert_eq!(queue.get_status().await.queued, 1);

        tokio::time::advance(Duration::from_millis(250)).await;
        let done = queue
            .complete_processing(first.id, Some(json!({"bytes": 42})))
            .await
            .unwrap();
        assert_eq!(done.state, ItemState::Completed);
        assert_eq!(done.result, Some(json!({"bytes": 42})));
        assert!(done.completed_at.is_some());

        assert_eq!(rx.recv().await.unwrap().id, second.id);
        assert!(queue.get_item_status(first.id).await.is_none());

        let status = queue.get_status().await;
        assert_eq!(status.totals.processed, 1);
        assert_eq!(status.avg_processing_ms, Some(250.0));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_callbacks_are_no_ops() {
        let (queue, mut rx) = manager(config());
        let item = queue.enqueue(json!({}), Priority::Normal).await.unwrap();
        rx.recv().await.unwrap();

        assert!(queue.complete_processing(item.id, None).await.is_some());
        assert!(queue.complete_processing(item.id, None).await.is_none());
        assert!(queue.fail_processing(item.id, "late").await.is_none());

        let status = queue.get_status().await;
        assert_eq!(status.totals.processed, 1);
        assert_eq!(status.totals.failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_schedules_retry_then_promotes_it() {
        let (queue, mut rx) = manager(config());
        let item = queue.enqueue(json!({}), Priority::Low).await.unwrap();
        rx.recv().await.unwrap();

        let action = queue.fail_processing(item.id, "connection reset").await;
        assert_eq!(
            action,
            Some(FailureAction::RetryScheduled {
                attempt: 1,
                delay: Duration::from_millis(1000),
            })
        );

        let waiting = queue.get_item_status(item.id).await.unwrap();
        assert_eq!(waiting.state, ItemState::FailedRetrying);
        assert_eq!(waiting.last_error.as_deref(), Some("connection reset"));
        assert!(waiting.next_retry_at.is_some());
        assert_eq!(queue.get_status().await.retry_pending, 1);

        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(queue.promote_due_retries().await, 0);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(queue.promote_due_retries().await, 1);

        let redispatched = rx.recv().await.unwrap();
        assert_eq!(redispatched.id, item.id);
        assert_eq!(redispatched.attempts, 2);
        assert_eq!(redispatched.next_retry_at, None);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_wakeup_is_signalled_on_schedule() {
        let (queue, mut rx) = manager(config());
        let item = queue.enqueue(json!({}), Priority::Normal).await.unwrap();
        rx.recv().await.unwrap();
        queue.fail_processing(item.id, "boom").await.unwrap();

        // notify_one stores a permit when nobody is waiting yet.
        tokio::time::timeout(Duration::from_millis(1), queue.retry_wakeup().notified())
            .await
            .unwrap();
        assert!(queue.next_retry_at().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_only_applies_to_queued_items() {
        let (queue, mut rx) = manager(QueueConfig {
            max_concurrent: 1,
            ..config()
        });
        let running = queue.enqueue(json!({}), Priority::Normal).await.unwrap();
        let waiting = queue.enqueue(json!({}), Priority::Normal).await.unwrap();
        rx.recv().await.unwrap();

        assert_eq!(queue.cancel(running.id).await, Ok(false));
        assert_eq!(queue.cancel(waiting.id).await, Ok(true));
        assert!(queue.get_item_status(waiting.id).await.is_none());
        assert_eq!(
            queue.cancel(waiting.id).await,
            Err(QueueError::ItemNotFound(waiting.id))
        );

        let status = queue.get_status().await;
        assert_eq!(status.queued, 0);
        assert_eq!(status.totals.cancelled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_dlq_only_touches_dead_letters() {
        let (queue, mut rx) = manager(QueueConfig {
            dlq_threshold: 1,
            ..config()
        });
        let doomed = queue.enqueue(json!({}), Priority::Normal).await.unwrap();
        let alive = queue.enqueue(json!({}), Priority::Normal).await.unwrap();
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();

        assert_eq!(
            queue.fail_processing(doomed.id, "404").await,
            Some(FailureAction::DeadLettered { attempts: 1 })
        );
        let dlq = queue.get_dlq_items().await;
        assert_eq!(dlq.len(), 1);
        assert_eq!(dlq[0].last_error.as_deref(), Some("404"));

        assert_eq!(queue.clear_dlq().await, 1);
        assert!(queue.get_dlq_items().await.is_empty());
        assert!(queue.get_item_status(doomed.id).await.is_none());
        assert!(!queue.retry_from_dlq(doomed.id).await);
        assert_eq!(
            queue.get_item_status(alive.id).await.unwrap().state,
            ItemState::Processing
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_fails_overdue_items_with_timeout_error() {
        let (queue, mut rx) = manager(QueueConfig {
            processing_timeout_ms: 500,
            ..config()
        });
        let item = queue.enqueue(json!({}), Priority::High).await.unwrap();
        rx.recv().await.unwrap();

        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(queue.sweep_timeouts().await.is_empty());

        tokio::time::advance(Duration::from_millis(1)).await;
        let swept = queue.sweep_timeouts().await;
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].0, item.id);

        let snapshot = queue.get_item_status(item.id).await.unwrap();
        assert_eq!(snapshot.state, ItemState::FailedRetrying);
        assert_eq!(
            snapshot.last_error.as_deref(),
            Some("processing timeout after 500ms")
        );
        assert_eq!(queue.get_status().await.processing, 0);

        // The worker's late answer is ignored.
        assert!(queue.complete_processing(item.id, None).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn answer_from_a_timed_out_attempt_does_not_touch_the_retry() {
        let (queue, mut rx) = manager(QueueConfig {
            processing_timeout_ms: 500,
            ..config()
        });
        let item = queue.enqueue(json!({}), Priority::Normal).await.unwrap();
        let first = rx.recv().await.unwrap();
        assert_eq!(first.attempts, 1);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(queue.sweep_timeouts().await.len(), 1);
        tokio::time::advance(Duration::from_millis(1000)).await;
        assert_eq!(queue.promote_due_retries().await, 1);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.attempts, 2);

        // The first attempt's worker finally answers.
        assert!(queue.fail_attempt(item.id, 1, "slow failure").await.is_none());
        assert!(queue.complete_attempt(item.id, 1, None).await.is_none());

        let snapshot = queue.get_item_status(item.id).await.unwrap();
        assert_eq!(snapshot.state, ItemState::Processing);
        assert_eq!(snapshot.attempts, 2);
        let status = queue.get_status().await;
        assert_eq!(status.processing, 1);
        assert_eq!(status.totals.failed, 1);
        assert_eq!(status.totals.processed, 0);

        let done = queue.complete_attempt(item.id, 2, None).await.unwrap();
        assert_eq!(done.attempts, 2);
        assert_eq!(queue.get_status().await.totals.processed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_dispatch_leaves_item_for_the_sweep() {
        let (queue, rx) = manager(QueueConfig {
            processing_timeout_ms: 100,
            dlq_threshold: 1,
            ..config()
        });
        drop(rx);
        let item = queue.enqueue(json!({}), Priority::Normal).await.unwrap();
        assert_eq!(queue.get_status().await.processing, 1);

        tokio::time::advance(Duration::from_millis(100)).await;
        let swept = queue.sweep_timeouts().await;
        assert_eq!(
            swept,
            vec![(item.id, FailureAction::DeadLettered { attempts: 1 })]
        );
        assert_eq!(queue.get_status().await.dlq, 1);
        assert!(queue.is_idle().await);
    }
}
