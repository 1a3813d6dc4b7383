//! Collaborator interfaces consumed by the scheduling engine.
//!
//! Implementations are swappable and contain no scheduling logic. The
//! engine only requires the contracts below: a factory resolving job
//! types to logic, a durable record store keyed by lane and uuid, a
//! lossless descriptor codec, and an optional lifecycle observer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Result, TaskLaneError};
use crate::retry::RetryDecision;
use crate::types::JobDescriptor;

/// User-supplied job logic.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Execute one attempt. An error routes the job through retry
    /// evaluation; success counts one run.
    async fn run(&self, descriptor: &JobDescriptor) -> Result<()>;

    /// Map a failed attempt to a retry decision. Evaluated once per
    /// failure. Defaults to `Cancel`, so retrying is explicit opt-in.
    fn on_retry(&self, _error: &TaskLaneError) -> RetryDecision {
        RetryDecision::Cancel
    }
}

/// Resolves a `job_type` key to job logic.
///
/// A construction failure surfaces as a scheduling rejection: the job is
/// aborted before it is persisted or enqueued.
pub trait JobFactory: Send + Sync {
    fn create(&self, job_type: &str, params: &serde_json::Value) -> Result<Arc<dyn JobHandler>>;
}

/// Durable store for pending job records.
///
/// Must tolerate concurrent `put`/`remove` for distinct uuids. All
/// operations are best-effort from the engine's perspective: a failed
/// write is logged and never blocks scheduling.
pub trait Persister: Send + Sync {
    /// Lane names present in the store, used to recover at startup.
    fn lanes(&self) -> Vec<String>;
    /// All serialized records for one lane.
    fn restore(&self, lane: &str) -> Vec<String>;
    /// Store or replace a record.
    fn put(&self, lane: &str, uuid: &str, data: &str) -> Result<()>;
    /// Remove a record. Idempotent.
    fn remove(&self, lane: &str, uuid: &str) -> Result<()>;
}

/// Lossless descriptor codec. `deserialize(serialize(d))` must round-trip
/// every `JobDescriptor` field.
pub trait RecordSerializer: Send + Sync {
    fn serialize(&self, descriptor: &JobDescriptor) -> Result<String>;
    fn deserialize(&self, data: &str) -> Result<JobDescriptor>;
}

/// Side-effect-only observer of job lifecycle events. Must not influence
/// scheduling outcomes.
#[async_trait]
pub trait JobListener: Send + Sync {
    /// An execution attempt is about to start.
    async fn on_run(&self, _descriptor: &JobDescriptor) {}
    /// The job reached terminal completion.
    async fn on_complete(&self, _descriptor: &JobDescriptor) {}
    /// The job was cancelled, explicitly or by retry policy.
    async fn on_cancel(&self, _descriptor: &JobDescriptor) {}
    /// The job was detached from its lane; fires exactly once per job.
    async fn on_remove(&self, _descriptor: &JobDescriptor) {}
}
