//! spool-core
//!
//! In-process priority work queue: three FIFO tiers, admission control,
//! bounded concurrency with timeout detection, retry with backoff, and a
//! dead-letter queue.
//!
//! # Modules
//! - **domain**: item model (ids, priority, state, errors, decisions)
//! - **ports**: seams for time, ids, admission rate, dispatch and processing
//! - **impls**: in-memory sliding-window limiter, channel dispatch
//! - **queue**: tiers, in-flight tracker, retry schedule, DLQ, `QueueManager`
//! - **app**: builder, reaper and worker loops, status snapshot
//! - **config**: `QueueConfig` and its TOML loading

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;

pub use app::{BuildError, QueueBuilder, QueueStatus, ReaperLoop, WorkerGroup};
pub use config::{ConfigError, QueueConfig};
pub use domain::{EnqueueRequest, ItemId, ItemState, Priority, QueueError, QueueItem};
pub use queue::{FailureAction, QueueManager};
