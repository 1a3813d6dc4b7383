//! Job unit — binds one job's logic to its descriptor and lifecycle
//! state, and drives retry evaluation for its own attempts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use tasklane_core::{
    IntervalPolicy, JobDescriptor, JobFactory, JobHandler, Result, RunLimit, TaskLaneError,
};

/// Lifecycle states.
///
/// `Created → Validated → Enqueued → Running → {Succeeded, Retrying,
/// Cancelled, Aborted}`. `Retrying` re-enters `Enqueued` after its delay,
/// `Succeeded` either finishes as `Completed` or loops back to `Enqueued`
/// for the next period. `Completed`, `Cancelled`, and `Aborted` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Validated,
    Enqueued,
    Running,
    Succeeded,
    Retrying,
    Completed,
    Cancelled,
    Aborted,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Cancelled | JobState::Aborted)
    }
}

/// Outcome of one execution attempt, consumed by the lane's drive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    /// Success and the job is exhausted (run-once, or periodic limit hit).
    Finished,
    /// Success with periodic runs remaining; go again after `interval`.
    Again { interval: Duration },
    /// Failure with another attempt scheduled after `delay`.
    RetryAfter { delay: Duration },
    /// Cancelled, by policy or externally.
    Cancelled,
}

/// The runtime instance of one job. Never shared across lanes; dropped
/// once its lifecycle reaches a terminal state and removal completes.
pub struct JobUnit {
    descriptor: Mutex<JobDescriptor>,
    handler: Arc<dyn JobHandler>,
    state: Mutex<JobState>,
    cancel_tx: watch::Sender<bool>,
    removed: AtomicBool,
}

impl JobUnit {
    pub fn new(descriptor: JobDescriptor, handler: Arc<dyn JobHandler>) -> Arc<Self> {
        let (cancel_tx, _) = watch::channel(false);
        Arc::new(Self {
            descriptor: Mutex::new(descriptor),
            handler,
            state: Mutex::new(JobState::Created),
            cancel_tx,
            removed: AtomicBool::new(false),
        })
    }

    /// Snapshot of the descriptor, counters included.
    pub fn descriptor(&self) -> JobDescriptor {
        self.descriptor.lock().unwrap().clone()
    }

    pub fn uuid(&self) -> uuid::Uuid {
        self.descriptor.lock().unwrap().uuid
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.descriptor.lock().unwrap().tags.contains(tag)
    }

    pub fn state(&self) -> JobState {
        *self.state.lock().unwrap()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == JobState::Cancelled
    }

    /// Move to `to` unless the unit is already terminal. Terminal states
    /// are never overwritten; that is what makes cancellation win races
    /// with in-flight transitions.
    pub(crate) fn transition(&self, to: JobState) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.is_terminal() {
            return false;
        }
        *state = to;
        true
    }

    /// Transition any non-terminal state directly to `Cancelled`,
    /// pre-empting an armed retry timer. Returns false if the unit was
    /// already terminal. In-flight logic is not interrupted; its result
    /// is discarded.
    pub fn cancel(&self) -> bool {
        if !self.transition(JobState::Cancelled) {
            return false;
        }
        self.cancel_tx.send_replace(true);
        true
    }

    /// Watch that flips to true when the unit is cancelled.
    pub(crate) fn cancel_signal(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }

    /// Guard so the removal callback fires exactly once.
    pub(crate) fn begin_removal(&self) -> bool {
        !self.removed.swap(true, Ordering::SeqCst)
    }

    /// Execute one attempt: run the logic, then either book the success
    /// or route the failure through the retry policy. The caller has
    /// already passed the `will_run` and `run` gates.
    pub(crate) async fn attempt(&self) -> AttemptOutcome {
        if !self.transition(JobState::Running) {
            return AttemptOutcome::Cancelled;
        }
        let snapshot = self.descriptor();
        let result = self.handler.run(&snapshot).await;

        // A cancellation that landed mid-execution wins; the result is
        // discarded for scheduling purposes.
        if self.is_cancelled() {
            return AttemptOutcome::Cancelled;
        }

        match result {
            Ok(()) => self.book_success(),
            Err(err) => self.handle_failure(&err),
        }
    }

    /// Increment `run_count`, consume one periodic run, and decide
    /// whether the job is exhausted.
    fn book_success(&self) -> AttemptOutcome {
        if !self.transition(JobState::Succeeded) {
            return AttemptOutcome::Cancelled;
        }
        let mut descriptor = self.descriptor.lock().unwrap();
        descriptor.run_count += 1;

        let outcome = match &mut descriptor.interval {
            IntervalPolicy::Once => AttemptOutcome::Finished,
            IntervalPolicy::Periodic { limit, interval } => match limit {
                RunLimit::Unlimited => AttemptOutcome::Again { interval: *interval },
                RunLimit::Limited(remaining) => {
                    *remaining = remaining.saturating_sub(1);
                    if *remaining == 0 {
                        AttemptOutcome::Finished
                    } else {
                        AttemptOutcome::Again { interval: *interval }
                    }
                }
            },
        };
        drop(descriptor);

        if outcome == AttemptOutcome::Finished && !self.transition(JobState::Completed) {
            return AttemptOutcome::Cancelled;
        }
        outcome
    }

    /// Consult the retry policy once for this failure. A retry increments
    /// `retry_count` and arms the computed delay; a cancel decision is
    /// terminal.
    pub(crate) fn handle_failure(&self, error: &TaskLaneError) -> AttemptOutcome {
        let decision = self.handler.on_retry(error);
        let next_retry = self.descriptor.lock().unwrap().retry_count + 1;
        match decision.delay_for(next_retry) {
            None => {
                tracing::info!(job = %self.uuid(), "job cancelled by retry policy: {error}");
                self.cancel();
                AttemptOutcome::Cancelled
            }
            Some(delay) => {
                if !self.transition(JobState::Retrying) {
                    return AttemptOutcome::Cancelled;
                }
                self.descriptor.lock().unwrap().retry_count = next_retry;
                tracing::debug!(job = %self.uuid(), "retry #{next_retry} in {delay:?}: {error}");
                AttemptOutcome::RetryAfter { delay }
            }
        }
    }

    /// Resolve job logic through the factory. A construction failure is a
    /// scheduling rejection, consumed during the `will_schedule` phase.
    pub(crate) fn resolve_handler(
        factory: &dyn JobFactory,
        descriptor: &JobDescriptor,
    ) -> Result<Arc<dyn JobHandler>> {
        factory
            .create(&descriptor.job_type, &descriptor.params)
            .map_err(|e| TaskLaneError::SchedulingRejected(e.to_string()))
    }
}
