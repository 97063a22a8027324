//! App - wiring and background loops around the QueueManager.
//!
//! # Components
//! - **QueueBuilder**: validates config and assembles the manager
//! - **ReaperLoop**: timeout sweep and retry promotion
//! - **WorkerGroup**: runs a Processor for each dispatched item
//! - **QueueStatus**: status snapshot

pub mod builder;
pub mod reaper_loop;
pub mod status;
pub mod worker_loop;

pub use self::builder::{BuildError, QueueBuilder};
pub use self::reaper_loop::ReaperLoop;
pub use self::status::QueueStatus;
pub use self::worker_loop::WorkerGroup;
