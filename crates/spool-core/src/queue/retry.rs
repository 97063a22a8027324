//! Retry policy: decides backoff delays.

use std::time::Duration;

/// Backoff schedule for failed items.
///
/// Delays come from an ordered table indexed by the attempt that just failed:
/// attempt 1 waits `delays[0]`, attempt 2 waits `delays[1]`, and so on. Lookups
/// past the end of the table clamp to its last entry, so the wait never grows
/// beyond the largest configured delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    /// An empty table falls back to retrying immediately.
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_millis(delays_ms: &[u64]) -> Self {
        Self::new(delays_ms.iter().copied().map(Duration::from_millis).collect())
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Delay before the next attempt, given how many attempts were made (1-indexed).
    ///
    /// `attempts = 0` is treated like the first attempt.
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let Some(last) = self.delays.len().checked_sub(1) else {
            return Duration::ZERO;
        };
        let index = (attempts.saturating_sub(1) as usize).min(last);
        self.delays[index]
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(&[1000, 5000, 15000])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_policy_matches_documented_table() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delays(),
            &[
                Duration::from_secs(1),
                Duration::from_secs(5),
                Duration::from_secs(15)
            ]
        );
    }

    #[rstest]
    #[case(0, 1000)]
    #[case(1, 1000)]
    #[case(2, 5000)]
    #[case(3, 15000)]
    #[case(4, 15000)]
    #[case(100, 15000)]
    fn lookups_clamp_to_last_entry(#[case] attempts: u32, #[case] expected_ms: u64) {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(attempts), Duration::from_millis(expected_ms));
    }

    #[test]
    fn delays_never_decrease() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (1..=6).map(|a| policy.next_delay(a)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn empty_table_retries_immediately() {
        let policy = RetryPolicy::new(vec![]);
        assert_eq!(policy.next_delay(3), Duration::ZERO);
    }
}
