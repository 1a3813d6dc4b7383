//! Pluggable veto points in the scheduling and execution pipeline.
//!
//! Constraints see only job metadata. The chain is evaluated in order
//! and short-circuits on the first veto; an empty chain always allows.

use tasklane_core::{JobDescriptor, Result};

/// A veto point evaluated at schedule time and around each attempt.
pub trait JobConstraint: Send + Sync {
    /// Evaluated once, synchronously, when a job is first submitted to a
    /// lane. An error aborts the job: never persisted, never enqueued.
    fn will_schedule(&self, _lane: &str, _job: &JobDescriptor) -> Result<()> {
        Ok(())
    }

    /// Evaluated immediately before each execution attempt, retries
    /// included. An error routes through normal failure handling, so the
    /// retry policy still governs further attempts.
    fn will_run(&self, _job: &JobDescriptor) -> Result<()> {
        Ok(())
    }

    /// Final yes/no gate at the moment the executor is ready. `false`
    /// defers the attempt without consuming a retry; the job stays
    /// eligible and is reconsidered later.
    fn run(&self, _job: &JobDescriptor) -> bool {
        true
    }
}

/// Ordered constraint list.
#[derive(Default)]
pub struct ConstraintChain {
    constraints: Vec<Box<dyn JobConstraint>>,
}

impl ConstraintChain {
    /// Empty chain: always allows scheduling and running.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, constraint: Box<dyn JobConstraint>) {
        self.constraints.push(constraint);
    }

    pub fn with(mut self, constraint: Box<dyn JobConstraint>) -> Self {
        self.push(constraint);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn will_schedule(&self, lane: &str, job: &JobDescriptor) -> Result<()> {
        for c in &self.constraints {
            c.will_schedule(lane, job)?;
        }
        Ok(())
    }

    pub fn will_run(&self, job: &JobDescriptor) -> Result<()> {
        for c in &self.constraints {
            c.will_run(job)?;
        }
        Ok(())
    }

    pub fn run(&self, job: &JobDescriptor) -> bool {
        self.constraints.iter().all(|c| c.run(job))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use tasklane_core::TaskLaneError;

    use super::*;

    struct Veto {
        calls: Arc<AtomicU32>,
    }

    impl JobConstraint for Veto {
        fn will_schedule(&self, _lane: &str, _job: &JobDescriptor) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TaskLaneError::SchedulingRejected("vetoed".into()))
        }

        fn run(&self, _job: &JobDescriptor) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    struct Allow {
        calls: Arc<AtomicU32>,
    }

    impl JobConstraint for Allow {
        fn will_schedule(&self, _lane: &str, _job: &JobDescriptor) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_empty_chain_allows() {
        let chain = ConstraintChain::new();
        let job = JobDescriptor::new("t");
        assert!(chain.will_schedule("default", &job).is_ok());
        assert!(chain.will_run(&job).is_ok());
        assert!(chain.run(&job));
    }

    #[test]
    fn test_first_veto_short_circuits() {
        let veto_calls = Arc::new(AtomicU32::new(0));
        let later_calls = Arc::new(AtomicU32::new(0));
        let chain = ConstraintChain::new()
            .with(Box::new(Veto { calls: veto_calls.clone() }))
            .with(Box::new(Allow { calls: later_calls.clone() }));

        let job = JobDescriptor::new("t");
        assert!(chain.will_schedule("default", &job).is_err());
        assert_eq!(veto_calls.load(Ordering::SeqCst), 1);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_run_gate_defers() {
        let calls = Arc::new(AtomicU32::new(0));
        let chain = ConstraintChain::new().with(Box::new(Veto { calls }));
        assert!(!chain.run(&JobDescriptor::new("t")));
    }
}
