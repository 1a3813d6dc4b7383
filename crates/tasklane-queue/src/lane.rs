//! Lane — a named, independently concurrency-bounded execution context.
//!
//! A lane owns its active job units, a per-lane admission limit on the
//! shared tokio worker pool, a suspended flag, and a two-phase recovery
//! barrier: while `Recovering`, restored units are admitted in ascending
//! `create_time` order and fresh submissions park until the phase flips
//! to `Steady`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, Notify, Semaphore};

use tasklane_core::{
    JobDescriptor, JobFactory, JobListener, Persister, RecordSerializer, Result,
};

use crate::constraint::ConstraintChain;
use crate::unit::{AttemptOutcome, JobState, JobUnit};

/// Recovery phase. Submissions arriving during `Recovering` are parked
/// until the phase flips, which guarantees restored jobs are admitted
/// first without requiring them to finish first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanePhase {
    Recovering,
    Steady,
}

/// Collaborators shared by every lane of a manager.
pub struct LaneContext {
    pub factory: Arc<dyn JobFactory>,
    pub persister: Arc<dyn Persister>,
    pub serializer: Arc<dyn RecordSerializer>,
    pub listener: Option<Arc<dyn JobListener>>,
    pub constraints: Arc<ConstraintChain>,
}

/// A named execution context holding job units.
///
/// All mutation of the active set goes through one mutex; persistence
/// writes and removals are best-effort and never block scheduling.
pub struct Lane {
    name: String,
    max_concurrent: Option<usize>,
    /// `None` = unbounded.
    limit: Option<Arc<Semaphore>>,
    active: Mutex<Vec<Arc<JobUnit>>>,
    suspended: watch::Sender<bool>,
    phase: watch::Sender<LanePhase>,
    /// Woken on resume and on unit completion so deferred units are
    /// reconsidered.
    reeval: Notify,
    ctx: Arc<LaneContext>,
    total_runs: AtomicU64,
}

impl Lane {
    /// Create a lane in the `Recovering` phase. `recover()` must be
    /// called (even on an empty store) to flip it to `Steady`.
    pub fn new(
        name: &str,
        max_concurrent: Option<usize>,
        suspended: bool,
        ctx: Arc<LaneContext>,
    ) -> Arc<Self> {
        let (suspended_tx, _) = watch::channel(suspended);
        let (phase_tx, _) = watch::channel(LanePhase::Recovering);
        Arc::new(Self {
            name: name.to_string(),
            max_concurrent,
            limit: max_concurrent.map(|n| Arc::new(Semaphore::new(n))),
            active: Mutex::new(Vec::new()),
            suspended: suspended_tx,
            phase: phase_tx,
            reeval: Notify::new(),
            ctx,
            total_runs: AtomicU64::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_suspended(&self) -> bool {
        *self.suspended.borrow()
    }

    pub fn phase(&self) -> LanePhase {
        *self.phase.borrow()
    }

    /// Submit a unit. No-op if the unit is already terminal. The only
    /// caller-visible failure is a `will_schedule` veto.
    pub async fn submit(self: &Arc<Self>, unit: Arc<JobUnit>) -> Result<()> {
        self.admit(unit, false).await
    }

    async fn admit(self: &Arc<Self>, unit: Arc<JobUnit>, recovered: bool) -> Result<()> {
        if unit.state().is_terminal() {
            return Ok(());
        }
        let descriptor = unit.descriptor();

        if let Err(err) = self.ctx.constraints.will_schedule(&self.name, &descriptor) {
            tracing::info!(
                "🚫 Lane[{}] rejected job {} at scheduling: {err}",
                self.name,
                descriptor.uuid
            );
            unit.transition(JobState::Aborted);
            self.finalize(&unit).await;
            return Err(err);
        }
        unit.transition(JobState::Validated);

        // Restored units already have a record; fresh durable ones get
        // one now. Failure is logged and the job still runs.
        if descriptor.persisted && !recovered {
            self.persist_record(&descriptor);
        }

        unit.transition(JobState::Enqueued);
        self.active.lock().await.push(unit.clone());
        tracing::debug!("📥 Lane[{}] enqueued job {}", self.name, descriptor.uuid);

        let lane = Arc::clone(self);
        let wait_barrier = !recovered;
        tokio::spawn(async move {
            lane.drive(unit, wait_barrier).await;
        });
        Ok(())
    }

    fn persist_record(&self, descriptor: &JobDescriptor) {
        match self.ctx.serializer.serialize(descriptor) {
            Ok(data) => {
                if let Err(e) =
                    self.ctx.persister.put(&self.name, &descriptor.uuid.to_string(), &data)
                {
                    tracing::warn!(
                        "⚠️ Lane[{}] failed to persist job {} (will run in-memory): {e}",
                        self.name,
                        descriptor.uuid
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Lane[{}] failed to serialize job {} (will run in-memory): {e}",
                    self.name,
                    descriptor.uuid
                );
            }
        }
    }

    /// Per-unit drive loop: wait out the recovery barrier and the
    /// suspended flag, take an admission slot, pass the attempt gates,
    /// execute, and evaluate the outcome until a terminal state.
    async fn drive(self: Arc<Self>, unit: Arc<JobUnit>, wait_barrier: bool) {
        let mut cancelled = unit.cancel_signal();

        if wait_barrier {
            let mut phase = self.phase.subscribe();
            loop {
                if *phase.borrow_and_update() == LanePhase::Steady {
                    break;
                }
                tokio::select! {
                    _ = phase.changed() => {}
                    _ = cancelled.changed() => break,
                }
            }
        }

        loop {
            if unit.state().is_terminal() {
                break;
            }

            // Suspension parks the unit without holding a slot.
            {
                let mut sus = self.suspended.subscribe();
                loop {
                    if !*sus.borrow_and_update() {
                        break;
                    }
                    tokio::select! {
                        _ = sus.changed() => {}
                        _ = cancelled.changed() => break,
                    }
                }
            }
            if unit.state().is_terminal() {
                break;
            }

            let permit = match &self.limit {
                Some(semaphore) => {
                    let acquired = tokio::select! {
                        permit = Arc::clone(semaphore).acquire_owned() => permit.ok(),
                        _ = cancelled.changed() => None,
                    };
                    match acquired {
                        Some(p) => Some(p),
                        None => continue,
                    }
                }
                None => None,
            };
            if unit.state().is_terminal() {
                break;
            }

            let snapshot = unit.descriptor();

            // Final yes/no gate: a deferral keeps the unit eligible and
            // costs nothing; it is reconsidered on the next re-eval.
            if !self.ctx.constraints.run(&snapshot) {
                drop(permit);
                tokio::select! {
                    _ = self.reeval.notified() => {}
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {}
                    _ = cancelled.changed() => {}
                }
                continue;
            }

            let outcome = match self.ctx.constraints.will_run(&snapshot) {
                Err(err) => unit.handle_failure(&err),
                Ok(()) => {
                    if let Some(listener) = &self.ctx.listener {
                        listener.on_run(&snapshot).await;
                    }
                    unit.attempt().await
                }
            };
            drop(permit);

            match outcome {
                AttemptOutcome::Finished => {
                    self.total_runs.fetch_add(1, Ordering::Relaxed);
                    break;
                }
                AttemptOutcome::Again { interval } => {
                    self.total_runs.fetch_add(1, Ordering::Relaxed);
                    unit.transition(JobState::Enqueued);
                    self.sleep_unless_cancelled(interval, &mut cancelled).await;
                }
                AttemptOutcome::RetryAfter { delay } => {
                    self.sleep_unless_cancelled(delay, &mut cancelled).await;
                    unit.transition(JobState::Enqueued);
                }
                AttemptOutcome::Cancelled => break,
            }
        }

        self.finalize(&unit).await;
    }

    async fn sleep_unless_cancelled(&self, delay: Duration, cancelled: &mut watch::Receiver<bool>) {
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancelled.changed() => {}
        }
    }

    /// Terminal clean-up, exactly once per unit: best-effort record
    /// removal, detach from the active set, listener callbacks.
    async fn finalize(&self, unit: &Arc<JobUnit>) {
        if !unit.begin_removal() {
            return;
        }
        let descriptor = unit.descriptor();
        if descriptor.persisted {
            if let Err(e) =
                self.ctx.persister.remove(&self.name, &descriptor.uuid.to_string())
            {
                tracing::warn!(
                    "⚠️ Lane[{}] failed to remove record for {}: {e}",
                    self.name,
                    descriptor.uuid
                );
            }
        }
        self.active.lock().await.retain(|u| !Arc::ptr_eq(u, unit));

        if let Some(listener) = &self.ctx.listener {
            match unit.state() {
                JobState::Completed => listener.on_complete(&descriptor).await,
                JobState::Cancelled => listener.on_cancel(&descriptor).await,
                _ => {}
            }
            listener.on_remove(&descriptor).await;
        }
        tracing::debug!(
            "🧹 Lane[{}] removed job {} ({:?})",
            self.name,
            descriptor.uuid,
            unit.state()
        );
        self.reeval.notify_waiters();
    }

    /// Stop admitting units to the executor. Running work is unaffected.
    pub fn suspend(&self) {
        self.suspended.send_replace(true);
        tracing::info!("⏸ Lane[{}] suspended", self.name);
    }

    /// Allow admissions again and re-evaluate every eligible unit.
    pub fn resume(&self) {
        self.suspended.send_replace(false);
        self.reeval.notify_waiters();
        tracing::info!("▶️ Lane[{}] resumed", self.name);
    }

    /// Cancel every active unit whose tag set contains `tag`.
    pub async fn cancel_tag(&self, tag: &str) -> usize {
        let matches: Vec<_> =
            self.active.lock().await.iter().filter(|u| u.has_tag(tag)).cloned().collect();
        self.cancel_units(matches)
    }

    /// Cancel the active unit with this uuid, if any.
    pub async fn cancel_uuid(&self, uuid: &uuid::Uuid) -> usize {
        let matches: Vec<_> =
            self.active.lock().await.iter().filter(|u| u.uuid() == *uuid).cloned().collect();
        self.cancel_units(matches)
    }

    fn cancel_units(&self, units: Vec<Arc<JobUnit>>) -> usize {
        let mut cancelled = 0;
        for unit in units {
            if unit.cancel() {
                cancelled += 1;
                tracing::info!("🚫 Lane[{}] cancelled job {}", self.name, unit.uuid());
            }
        }
        cancelled
    }

    /// Restore persisted jobs for this lane, admit them in ascending
    /// `create_time` order, then flip the phase to `Steady`. Recovery is
    /// best-effort: unreadable records and unregistered job types are
    /// skipped, logged, and left in the store.
    pub async fn recover(self: &Arc<Self>) {
        self.phase.send_replace(LanePhase::Recovering);

        let records = self.ctx.persister.restore(&self.name);
        let mut units = Vec::new();
        for record in records {
            let descriptor = match self.ctx.serializer.deserialize(&record) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("⚠️ Lane[{}] skipping unreadable record: {e}", self.name);
                    continue;
                }
            };
            match JobUnit::resolve_handler(self.ctx.factory.as_ref(), &descriptor) {
                Ok(handler) => units.push(JobUnit::new(descriptor, handler)),
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Lane[{}] skipping record {}: {e}",
                        self.name,
                        descriptor.uuid
                    );
                }
            }
        }
        units.sort_by_key(|u| u.descriptor().create_time);

        let restored = units.len();
        for unit in units {
            // A will_schedule veto on a restored unit is already logged
            // and finalized inside admit.
            let _ = self.admit(unit, true).await;
        }

        self.phase.send_replace(LanePhase::Steady);
        self.reeval.notify_waiters();
        if restored > 0 {
            tracing::info!("📦 Lane[{}] recovered {restored} job(s)", self.name);
        }
    }

    /// Point-in-time counters for this lane.
    pub async fn stats(&self) -> LaneStats {
        LaneStats {
            lane: self.name.clone(),
            active: self.active.lock().await.len(),
            suspended: self.is_suspended(),
            max_concurrent: self.max_concurrent,
            total_runs: self.total_runs.load(Ordering::Relaxed),
        }
    }
}

/// Statistics for a single lane.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LaneStats {
    pub lane: String,
    pub active: usize,
    pub suspended: bool,
    pub max_concurrent: Option<usize>,
    pub total_runs: u64,
}
