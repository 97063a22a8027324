//! Cumulative counters and rolling processing-duration average.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cumulative counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTotals {
    pub enqueued: u64,
    pub processed: u64,
    pub failed: u64,
    pub dead_lettered: u64,
    pub cancelled: u64,
    pub rejected_full: u64,
    pub rejected_rate: u64,
}

#[derive(Debug)]
pub struct Metrics {
    pub totals: QueueTotals,
    durations: VecDeque<Duration>,
    sum: Duration,
    window: usize,
}

impl Metrics {
    /// `window` is the number of recent completions averaged (at least 1).
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            totals: QueueTotals::default(),
            durations: VecDeque::with_capacity(window),
            sum: Duration::ZERO,
            window,
        }
    }

    pub fn record_duration(&mut self, duration: Duration) {
        if self.durations.len() == self.window
            && let Some(oldest) = self.durations.pop_front()
        {
            self.sum -= oldest;
        }
        self.durations.push_back(duration);
        self.sum += duration;
    }

    /// Mean over the window; `None` before the first completion.
    pub fn average_duration(&self) -> Option<Duration> {
        let n = u32::try_from(self.durations.len()).ok().filter(|n| *n > 0)?;
        Some(self.sum / n)
    }
}
