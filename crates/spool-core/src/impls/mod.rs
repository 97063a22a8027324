//! Impls - in-process implementations of the ports.
//!
//! # Included
//! - **SlidingWindowLimiter**: in-memory AdmissionLimiter
//! - **mpsc::UnboundedSender**: DispatchSink feeding a worker channel
//!
//! A limiter shared between processes would live in its own crate.

pub mod channel;
pub mod sliding_window;

pub use self::channel::{DispatchReceiver, dispatch_channel};
pub use self::sliding_window::SlidingWindowLimiter;
