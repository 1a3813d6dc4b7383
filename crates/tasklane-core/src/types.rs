//! Job descriptor data model — immutable identity plus mutable
//! scheduling state.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lane used when a job does not name one explicitly.
pub const DEFAULT_LANE: &str = "default";

/// How many successful runs a periodic job has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunLimit {
    /// Re-run forever.
    Unlimited,
    /// Remaining-run count, decremented on every successful completion.
    Limited(u32),
}

/// One-shot or periodic execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IntervalPolicy {
    /// Run exactly once.
    Once,
    /// Re-run every `interval` until `limit` is exhausted.
    Periodic { limit: RunLimit, interval: Duration },
}

/// Metadata identifying and configuring one job.
///
/// `uuid`, `job_type`, `lane`, and `create_time` are fixed at creation;
/// `run_count`, `retry_count`, and a periodic `interval` limit are
/// mutated only by the owning job unit during its own execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Globally unique id, assigned at creation.
    pub uuid: Uuid,
    /// Lane this job is routed to.
    pub lane: String,
    /// Key resolving to job logic via the `JobFactory`.
    pub job_type: String,
    /// Tags for group cancellation. No uniqueness across jobs.
    #[serde(default)]
    pub tags: HashSet<String>,
    /// Set once at first scheduling; orders restart recovery.
    pub create_time: DateTime<Utc>,
    /// If true the descriptor is durably stored while pending.
    #[serde(default)]
    pub persisted: bool,
    /// Successful executions so far. Only ever increases.
    #[serde(default)]
    pub run_count: u32,
    /// Retries scheduled so far. Drives exponential back-off growth.
    #[serde(default)]
    pub retry_count: u32,
    /// Run-once or periodic scheduling.
    pub interval: IntervalPolicy,
    /// Opaque payload handed to the job factory.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl JobDescriptor {
    /// New run-once, non-persisted descriptor on the default lane.
    pub fn new(job_type: &str) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            lane: DEFAULT_LANE.to_string(),
            job_type: job_type.to_string(),
            tags: HashSet::new(),
            create_time: Utc::now(),
            persisted: false,
            run_count: 0,
            retry_count: 0,
            interval: IntervalPolicy::Once,
            params: serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_descriptor_defaults() {
        let d = JobDescriptor::new("email");
        assert_eq!(d.lane, DEFAULT_LANE);
        assert_eq!(d.job_type, "email");
        assert_eq!(d.run_count, 0);
        assert_eq!(d.retry_count, 0);
        assert!(!d.persisted);
        assert_eq!(d.interval, IntervalPolicy::Once);
    }

    #[test]
    fn test_uuid_unique_per_descriptor() {
        assert_ne!(JobDescriptor::new("a").uuid, JobDescriptor::new("a").uuid);
    }
}
