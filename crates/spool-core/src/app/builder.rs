//! QueueBuilder - wires a QueueManager from a config and optional ports.
//!
//! Validation happens in `build()` (fail fast): an invalid config never
//! produces a running queue.

use std::sync::Arc;

use crate::config::{ConfigError, QueueConfig};
use crate::domain::{Decider, DefaultDecider};
use crate::impls::{DispatchReceiver, SlidingWindowLimiter, dispatch_channel};
use crate::ports::{AdmissionLimiter, Clock, DispatchSink, IdGenerator, SystemClock, UlidGenerator};
use crate::queue::QueueManager;

/// Builds a `QueueManager`.
///
/// Any port left unset gets its in-memory default: a sliding-window limiter
/// at `rate_limit`, the system clock, ULID ids, and the threshold decider.
///
/// # Example
/// ```ignore
/// let (queue, rx) = QueueBuilder::new(QueueConfig::default()).build()?;
/// let reaper = ReaperLoop::spawn(Arc::clone(&queue));
/// let workers = WorkerGroup::spawn(Arc::clone(&queue), rx, processor);
/// ```
pub struct QueueBuilder {
    config: QueueConfig,
    limiter: Option<Arc<dyn AdmissionLimiter>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    decider: Option<Arc<dyn Decider>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl QueueBuilder {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            limiter: None,
            clock: None,
            ids: None,
            decider: None,
        }
    }

    pub fn limiter(mut self, limiter: Arc<dyn AdmissionLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn decider(mut self, decider: Arc<dyn Decider>) -> Self {
        self.decider = Some(decider);
        self
    }

    /// Build with the channel dispatch sink; workers read from the returned
    /// receiver.
    pub fn build(self) -> Result<(Arc<QueueManager>, DispatchReceiver), BuildError> {
        let (tx, rx) = dispatch_channel();
        let queue = self.build_with_sink(Arc::new(tx))?;
        Ok((queue, rx))
    }

    /// Build against a caller-supplied worker boundary.
    pub fn build_with_sink(
        self,
        dispatch: Arc<dyn DispatchSink>,
    ) -> Result<Arc<QueueManager>, BuildError> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));
        let limiter = self
            .limiter
            .unwrap_or_else(|| Arc::new(SlidingWindowLimiter::per_second(self.config.rate_limit)));
        let decider = self.decider.unwrap_or_else(|| {
            Arc::new(DefaultDecider::new(
                self.config.retry_policy(),
                self.config.dlq_threshold,
            ))
        });

        Ok(Arc::new(QueueManager::new(
            self.config,
            limiter,
            dispatch,
            decider,
            clock,
            ids,
        )))
    }
}

impl Default for QueueBuilder {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}
