//! # TaskLane
//!
//! A durable, constraint-checked job scheduler for embedding in host
//! applications. Jobs are routed to named lanes with independent
//! concurrency bounds, optionally persisted so they survive restarts,
//! and re-attempted under a per-job retry policy.
//!
//! ```ignore
//! use std::sync::Arc;
//! use tasklane::prelude::*;
//!
//! let manager = QueueManager::builder(Arc::new(MyFactory))
//!     .persister(Arc::new(SqlitePersister::open_default()?))
//!     .build()
//!     .await;
//!
//! JobBuilder::new("sync")
//!     .lane("background")
//!     .persist()
//!     .schedule(&manager)
//!     .await?;
//! ```

pub use tasklane_core::{
    IntervalPolicy, JobDescriptor, JobFactory, JobHandler, JobListener, LaneConfig, Persister,
    RecordSerializer, Result, RetryDecision, RunLimit, TaskLaneConfig, TaskLaneError, DEFAULT_LANE,
};
pub use tasklane_queue::{
    ConstraintChain, JobBuilder, JobConstraint, JobState, JsonSerializer, Lane, LaneStats,
    ManagerBuilder, MemoryPersister, QueueManager, SqlitePersister,
};

/// One-stop imports for typical hosts.
pub mod prelude {
    pub use tasklane_core::{
        IntervalPolicy, JobDescriptor, JobFactory, JobHandler, JobListener, Result, RetryDecision,
        RunLimit, TaskLaneConfig, TaskLaneError,
    };
    pub use tasklane_queue::{
        JobBuilder, JobConstraint, JsonSerializer, ManagerBuilder, MemoryPersister, QueueManager,
        SqlitePersister,
    };
}
