//! SlidingWindowLimiter - in-memory AdmissionLimiter.
//!
//! Keeps the timestamps of admissions inside the rolling window and admits
//! while fewer than `limit` remain. Exact over any window-length interval,
//! unlike a fixed-window counter that allows bursts at bucket edges.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::QueueError;
use crate::ports::AdmissionLimiter;

pub struct SlidingWindowLimiter {
    limit: u32,
    window: Duration,
    admitted: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// `limit` admissions per `window`.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            admitted: Mutex::new(VecDeque::with_capacity(limit as usize)),
        }
    }

    /// `limit` admissions per second.
    pub fn per_second(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(1))
    }

    fn evict_expired(&self, admitted: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = admitted.front() {
            if now.saturating_duration_since(oldest) < self.window {
                break;
            }
            admitted.pop_front();
        }
    }
}

#[async_trait]
impl AdmissionLimiter for SlidingWindowLimiter {
    async fn try_acquire(&self) -> Result<bool, QueueError> {
        let now = Instant::now();
        let mut admitted = self
            .admitted
            .lock()
            .map_err(|e| QueueError::Limiter(e.to_string()))?;
        self.evict_expired(&mut admitted, now);

        if admitted.len() >= self.limit as usize {
            return Ok(false);
        }
        admitted.push_back(now);
        Ok(true)
    }

    async fn current_rate(&self) -> u32 {
        let now = Instant::now();
        let mut admitted = self.admitted.lock().unwrap_or_else(|e| e.into_inner());
        self.evict_expired(&mut admitted, now);
        admitted.len() as u32
    }

    fn limit(&self) -> u32 {
        self.limit
    }
}
