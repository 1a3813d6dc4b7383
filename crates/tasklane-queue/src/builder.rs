//! Fluent construction of job descriptors.

use std::time::Duration;

use uuid::Uuid;

use tasklane_core::{IntervalPolicy, JobDescriptor, Result, RunLimit};

use crate::manager::QueueManager;

/// Builds a [`JobDescriptor`] and optionally submits it in one chain:
///
/// ```ignore
/// let uuid = JobBuilder::new("sync")
///     .lane("background")
///     .tag("nightly")
///     .persist()
///     .params(serde_json::json!({ "path": "/data" }))
///     .schedule(&manager)
///     .await?;
/// ```
pub struct JobBuilder {
    descriptor: JobDescriptor,
}

impl JobBuilder {
    /// A run-once, transient job of the given type on the default lane.
    pub fn new(job_type: &str) -> Self {
        Self { descriptor: JobDescriptor::new(job_type) }
    }

    /// Route the job to a named lane.
    pub fn lane(mut self, name: &str) -> Self {
        self.descriptor.lane = name.to_string();
        self
    }

    /// Attach a tag for group cancellation. Repeatable.
    pub fn tag(mut self, tag: &str) -> Self {
        self.descriptor.tags.insert(tag.to_string());
        self
    }

    /// Persist the job so it survives a restart.
    pub fn persist(mut self) -> Self {
        self.descriptor.persisted = true;
        self
    }

    /// Run repeatedly: up to `limit` successful runs, spaced by
    /// `interval`.
    pub fn periodic(mut self, limit: RunLimit, interval: Duration) -> Self {
        self.descriptor.interval = IntervalPolicy::Periodic { limit, interval };
        self
    }

    /// Opaque payload handed to the factory and the job logic.
    pub fn params(mut self, params: serde_json::Value) -> Self {
        self.descriptor.params = params;
        self
    }

    pub fn build(self) -> JobDescriptor {
        self.descriptor
    }

    /// Submit through a manager. Shorthand for `manager.submit(build())`.
    pub async fn schedule(self, manager: &QueueManager) -> Result<Uuid> {
        manager.submit(self.descriptor).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testutil::{wait_until, CountingHandler, RecordingListener, TestFactory};

    #[test]
    fn test_builder_sets_every_field() {
        let descriptor = JobBuilder::new("sync")
            .lane("background")
            .tag("nightly")
            .tag("tenant-7")
            .persist()
            .periodic(RunLimit::Limited(3), Duration::from_secs(60))
            .params(serde_json::json!({ "depth": 2 }))
            .build();

        assert_eq!(descriptor.job_type, "sync");
        assert_eq!(descriptor.lane, "background");
        assert!(descriptor.tags.contains("nightly"));
        assert!(descriptor.tags.contains("tenant-7"));
        assert!(descriptor.persisted);
        assert_eq!(
            descriptor.interval,
            IntervalPolicy::Periodic {
                limit: RunLimit::Limited(3),
                interval: Duration::from_secs(60)
            }
        );
        assert_eq!(descriptor.params["depth"], 2);
        assert_eq!(descriptor.run_count, 0);
        assert_eq!(descriptor.retry_count, 0);
    }

    #[tokio::test]
    async fn test_schedule_submits_through_manager() {
        let handler = CountingHandler::new();
        let factory = TestFactory::new();
        factory.register("t", handler.clone());
        let listener = RecordingListener::new();
        let manager = QueueManager::builder(factory).listener(listener.clone()).build().await;

        JobBuilder::new("t").tag("one-off").schedule(&manager).await.unwrap();
        wait_until(|| listener.removed.load(Ordering::SeqCst) == 1).await;
        assert_eq!(handler.runs(), 1);
    }
}
