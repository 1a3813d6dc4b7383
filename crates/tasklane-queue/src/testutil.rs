//! Shared test fixtures: counting job handlers, a map-backed factory,
//! and a recording listener.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use tasklane_core::{
    JobDescriptor, JobFactory, JobHandler, JobListener, Result, RetryDecision, TaskLaneError,
};

/// Handler that counts attempts and can be told to fail the next N of
/// them, optionally pausing mid-run until released.
pub(crate) struct CountingHandler {
    runs: AtomicU32,
    fail_next: AtomicU32,
    retry: Mutex<RetryDecision>,
    /// Execution order log shared across handlers, for ordering tests.
    order: Mutex<Option<Arc<Mutex<Vec<String>>>>>,
    hold: Mutex<Option<Arc<Notify>>>,
    started: Arc<Notify>,
}

impl CountingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            runs: AtomicU32::new(0),
            fail_next: AtomicU32::new(0),
            retry: Mutex::new(RetryDecision::Cancel),
            order: Mutex::new(None),
            hold: Mutex::new(None),
            started: Arc::new(Notify::new()),
        })
    }

    /// Attempts made so far (failures included).
    pub fn runs(&self) -> u32 {
        self.runs.load(Ordering::SeqCst)
    }

    /// Fail the next `n` attempts.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn set_retry(&self, decision: RetryDecision) {
        *self.retry.lock().unwrap() = decision;
    }

    /// Record execution order into a shared log.
    pub fn log_order_to(&self, log: Arc<Mutex<Vec<String>>>) {
        *self.order.lock().unwrap() = Some(log);
    }

    /// Block each run until `release` is notified; `started_signal` fires
    /// when a run begins.
    pub fn hold_runs(&self, release: Arc<Notify>) {
        *self.hold.lock().unwrap() = Some(release);
    }

    pub fn started_signal(&self) -> Arc<Notify> {
        self.started.clone()
    }
}

#[async_trait]
impl JobHandler for CountingHandler {
    async fn run(&self, descriptor: &JobDescriptor) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = self.order.lock().unwrap().clone() {
            log.lock().unwrap().push(descriptor.job_type.clone());
        }
        let hold = self.hold.lock().unwrap().clone();
        if let Some(release) = hold {
            self.started.notify_one();
            release.notified().await;
        }
        if self.fail_next.load(Ordering::SeqCst) > 0 {
            self.fail_next.fetch_sub(1, Ordering::SeqCst);
            return Err(TaskLaneError::Execution("induced failure".into()));
        }
        Ok(())
    }

    fn on_retry(&self, _error: &TaskLaneError) -> RetryDecision {
        *self.retry.lock().unwrap()
    }
}

/// Factory backed by a type → handler map. Unknown types are a
/// scheduling rejection, like an unregistered job after a restart.
#[derive(Default)]
pub(crate) struct TestFactory {
    handlers: Mutex<HashMap<String, Arc<dyn JobHandler>>>,
}

impl TestFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(&self, job_type: &str, handler: Arc<dyn JobHandler>) {
        self.handlers.lock().unwrap().insert(job_type.to_string(), handler);
    }
}

impl JobFactory for TestFactory {
    fn create(&self, job_type: &str, _params: &serde_json::Value) -> Result<Arc<dyn JobHandler>> {
        self.handlers
            .lock()
            .unwrap()
            .get(job_type)
            .cloned()
            .ok_or_else(|| TaskLaneError::SchedulingRejected(format!("no handler for '{job_type}'")))
    }
}

/// Listener that counts lifecycle events.
#[derive(Default)]
pub(crate) struct RecordingListener {
    pub ran: AtomicU32,
    pub completed: AtomicU32,
    pub cancelled: AtomicU32,
    pub removed: AtomicU32,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl JobListener for RecordingListener {
    async fn on_run(&self, _descriptor: &JobDescriptor) {
        self.ran.fetch_add(1, Ordering::SeqCst);
    }
    async fn on_complete(&self, _descriptor: &JobDescriptor) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
    async fn on_cancel(&self, _descriptor: &JobDescriptor) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }
    async fn on_remove(&self, _descriptor: &JobDescriptor) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Poll until `cond` holds or a 2s deadline expires.
pub(crate) async fn wait_until(cond: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not reached within deadline");
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

/// Give spawned drive tasks a chance to make progress, for
/// "nothing happened" style assertions.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
