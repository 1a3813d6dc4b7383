//! # TaskLane Core
//!
//! Shared data model, collaborator traits, and configuration for the
//! TaskLane scheduler. The execution engine lives in `tasklane-queue`;
//! this crate holds everything both the engine and host applications
//! need to agree on:
//!
//! - `JobDescriptor` — persisted/transient job metadata
//! - `RetryDecision` — failure-to-decision mapping for re-attempts
//! - Collaborator traits: `JobHandler`, `JobFactory`, `Persister`,
//!   `RecordSerializer`, `JobListener`
//! - `TaskLaneError` / `Result` — the crate-wide error type
//! - `TaskLaneConfig` — serde-defaulted TOML configuration

pub mod config;
pub mod error;
pub mod retry;
pub mod traits;
pub mod types;

pub use config::{LaneConfig, TaskLaneConfig};
pub use error::{Result, TaskLaneError};
pub use retry::RetryDecision;
pub use traits::{JobFactory, JobHandler, JobListener, Persister, RecordSerializer};
pub use types::{IntervalPolicy, JobDescriptor, RunLimit, DEFAULT_LANE};
