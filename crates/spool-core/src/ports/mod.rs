//! Ports - the seams between the queue core and its collaborators.
//!
//! Each trait hides a collaborator the queue depends on (time, ID allocation,
//! admission rate, the worker boundary) so it can be swapped in tests or for
//! another deployment.

pub mod clock;
pub mod dispatch;
pub mod id_generator;
pub mod limiter;
pub mod processor;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::dispatch::DispatchSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::limiter::AdmissionLimiter;
pub use self::processor::Processor;
