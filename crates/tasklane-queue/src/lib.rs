//! # TaskLane Queue
//!
//! The scheduling and execution engine: per-lane bounded concurrency,
//! job lifecycle state machine, constraint pipeline, retry evaluation,
//! and restart recovery over a pluggable persistence backend.
//!
//! ## Architecture
//! ```text
//! QueueManager
//!   ├── Lane "default" (max_concurrent: 4)
//!   │     ├── recovery phase: Recovering → Steady
//!   │     ├── JobUnit: Created → Validated → Enqueued → Running → ...
//!   │     └── suspend/resume, cancel(tag|uuid)
//!   ├── Lane "sync" (max_concurrent: 1, serial)
//!   └── collaborators: JobFactory / Persister / RecordSerializer / JobListener
//!
//! submit → will_schedule gate → persist (best-effort) → enqueue
//!   → will_run + run gates → execute → retry policy on failure
//!   → remove persisted record on terminal state
//! ```

pub mod builder;
pub mod constraint;
pub mod lane;
pub mod manager;
pub mod persist;
pub mod serializer;
pub mod unit;

pub use builder::JobBuilder;
pub use constraint::{ConstraintChain, JobConstraint};
pub use lane::{Lane, LaneContext, LanePhase, LaneStats};
pub use manager::{ManagerBuilder, QueueManager};
pub use persist::{MemoryPersister, SqlitePersister};
pub use serializer::JsonSerializer;
pub use tasklane_core::RetryDecision;
pub use unit::{JobState, JobUnit};

#[cfg(test)]
pub(crate) mod testutil;
