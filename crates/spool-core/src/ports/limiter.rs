//! AdmissionLimiter port - submission rate gate.
//!
//! The queue only needs check-and-increment semantics. The in-memory
//! `SlidingWindowLimiter` covers a single process; a shared-store limiter for
//! several nodes would implement the same trait.

use async_trait::async_trait;

use crate::domain::QueueError;

#[async_trait]
pub trait AdmissionLimiter: Send + Sync {
    /// Record one admission if the window allows it.
    ///
    /// `Ok(false)` means "rate exceeded"; nothing was recorded.
    async fn try_acquire(&self) -> Result<bool, QueueError>;

    /// Admissions counted in the current window.
    async fn current_rate(&self) -> u32;

    /// Maximum admissions per window.
    fn limit(&self) -> u32;
}
