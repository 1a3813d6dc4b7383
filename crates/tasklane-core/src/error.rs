//! Error taxonomy shared across TaskLane crates.
//!
//! Constraint and execution failures are resolved locally by the retry
//! state machine and never propagate to the submitting caller; the only
//! synchronous caller-visible failure is `SchedulingRejected`.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TaskLaneError>;

/// All failure modes observable inside the scheduler.
#[derive(Debug, Clone, Error)]
pub enum TaskLaneError {
    /// A `will_schedule` constraint vetoed the job at submission time.
    /// The job never runs and is never persisted.
    #[error("scheduling rejected: {0}")]
    SchedulingRejected(String),

    /// A `will_run` constraint vetoed an execution attempt. Governed by
    /// the retry policy like any other attempt failure.
    #[error("run rejected: {0}")]
    RunRejected(String),

    /// The job logic itself failed.
    #[error("execution failed: {0}")]
    Execution(String),

    /// A persisted record could not be rebuilt during recovery. The
    /// record is skipped and left in the store.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Best-effort persistence failed. Logged, never fatal.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration could not be loaded or parsed.
    #[error("config error: {0}")]
    Config(String),
}
