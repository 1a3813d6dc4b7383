//! Queue manager — the host-facing entry point.
//!
//! Owns the lane map, routes submissions by lane name, fans out
//! suspend/resume/cancel across lanes, and drives restart recovery for
//! every lane the persister knows about.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use tasklane_core::{
    JobDescriptor, JobFactory, JobListener, Persister, RecordSerializer, Result, TaskLaneConfig,
};

use crate::constraint::{ConstraintChain, JobConstraint};
use crate::lane::{Lane, LaneContext, LaneStats};
use crate::persist::MemoryPersister;
use crate::serializer::JsonSerializer;
use crate::unit::JobUnit;

/// Routes jobs to lanes and manages their shared collaborators.
///
/// Lanes are created on demand; each new lane recovers its persisted
/// records before fresh submissions are admitted to the executor.
pub struct QueueManager {
    ctx: Arc<LaneContext>,
    config: TaskLaneConfig,
    lanes: Mutex<HashMap<String, Arc<Lane>>>,
    suspended: AtomicBool,
}

impl QueueManager {
    /// Start configuring a manager around a job factory.
    pub fn builder(factory: Arc<dyn JobFactory>) -> ManagerBuilder {
        ManagerBuilder::new(factory)
    }

    /// Submit a job. Resolves its logic through the factory, routes it
    /// to its lane, and returns the job's uuid. The only failures are a
    /// factory miss and a `will_schedule` veto.
    pub async fn submit(&self, mut descriptor: JobDescriptor) -> Result<Uuid> {
        if descriptor.lane.is_empty() {
            descriptor.lane = self.config.default_lane.clone();
        }
        let handler = JobUnit::resolve_handler(self.ctx.factory.as_ref(), &descriptor)?;
        let uuid = descriptor.uuid;
        let lane = self.lane(&descriptor.lane.clone()).await;
        lane.submit(JobUnit::new(descriptor, handler)).await?;
        Ok(uuid)
    }

    /// Get or create the named lane. A freshly created lane recovers its
    /// persisted records before reaching steady state.
    pub async fn lane(&self, name: &str) -> Arc<Lane> {
        let (lane, created) = {
            let mut lanes = self.lanes.lock().await;
            match lanes.get(name) {
                Some(lane) => (Arc::clone(lane), false),
                None => {
                    let lane = Lane::new(
                        name,
                        self.config.max_concurrent_for(name),
                        self.suspended.load(Ordering::SeqCst),
                        Arc::clone(&self.ctx),
                    );
                    lanes.insert(name.to_string(), Arc::clone(&lane));
                    tracing::debug!("🛤 Created lane '{name}'");
                    (lane, true)
                }
            }
        };
        if created {
            lane.recover().await;
        }
        lane
    }

    /// Stop admitting jobs to the executor, in every lane present and
    /// future. Running jobs finish normally.
    pub async fn suspend(&self) {
        self.suspended.store(true, Ordering::SeqCst);
        for lane in self.lanes.lock().await.values() {
            lane.suspend();
        }
    }

    /// Allow admissions again in every lane.
    pub async fn resume(&self) {
        self.suspended.store(false, Ordering::SeqCst);
        for lane in self.lanes.lock().await.values() {
            lane.resume();
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// Cancel every active job carrying `tag`, across all lanes.
    /// Returns how many jobs were cancelled.
    pub async fn cancel_tag(&self, tag: &str) -> usize {
        let lanes: Vec<_> = self.lanes.lock().await.values().cloned().collect();
        let mut cancelled = 0;
        for lane in lanes {
            cancelled += lane.cancel_tag(tag).await;
        }
        cancelled
    }

    /// Cancel the job with this uuid, wherever it lives.
    pub async fn cancel_uuid(&self, uuid: &Uuid) -> usize {
        let lanes: Vec<_> = self.lanes.lock().await.values().cloned().collect();
        let mut cancelled = 0;
        for lane in lanes {
            cancelled += lane.cancel_uuid(uuid).await;
        }
        cancelled
    }

    /// Point-in-time stats for every lane, sorted by lane name.
    pub async fn stats(&self) -> Vec<LaneStats> {
        let lanes: Vec<_> = self.lanes.lock().await.values().cloned().collect();
        let mut stats = Vec::with_capacity(lanes.len());
        for lane in lanes {
            stats.push(lane.stats().await);
        }
        stats.sort_by(|a, b| a.lane.cmp(&b.lane));
        stats
    }
}

/// Builder for [`QueueManager`]. Only the factory is required; the
/// persister defaults to in-memory and the codec to JSON.
pub struct ManagerBuilder {
    factory: Arc<dyn JobFactory>,
    persister: Option<Arc<dyn Persister>>,
    serializer: Option<Arc<dyn RecordSerializer>>,
    listener: Option<Arc<dyn JobListener>>,
    constraints: ConstraintChain,
    config: TaskLaneConfig,
}

impl ManagerBuilder {
    pub fn new(factory: Arc<dyn JobFactory>) -> Self {
        Self {
            factory,
            persister: None,
            serializer: None,
            listener: None,
            constraints: ConstraintChain::new(),
            config: TaskLaneConfig::default(),
        }
    }

    pub fn persister(mut self, persister: Arc<dyn Persister>) -> Self {
        self.persister = Some(persister);
        self
    }

    pub fn serializer(mut self, serializer: Arc<dyn RecordSerializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn JobListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Append a constraint; evaluation order is insertion order.
    pub fn constraint(mut self, constraint: Box<dyn JobConstraint>) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn config(mut self, config: TaskLaneConfig) -> Self {
        self.config = config;
        self
    }

    /// Create lanes suspended; nothing runs until `resume()`.
    pub fn start_suspended(mut self) -> Self {
        self.config.start_suspended = true;
        self
    }

    /// Build the manager and recover every lane the persister knows
    /// about, so pending jobs run without waiting for a submission to
    /// touch their lane.
    pub async fn build(self) -> QueueManager {
        let persister =
            self.persister.unwrap_or_else(|| Arc::new(MemoryPersister::new()) as Arc<dyn Persister>);
        let manager = QueueManager {
            ctx: Arc::new(LaneContext {
                factory: self.factory,
                persister: Arc::clone(&persister),
                serializer: self
                    .serializer
                    .unwrap_or_else(|| Arc::new(JsonSerializer) as Arc<dyn RecordSerializer>),
                listener: self.listener,
                constraints: Arc::new(self.constraints),
            }),
            suspended: AtomicBool::new(self.config.start_suspended),
            config: self.config,
            lanes: Mutex::new(HashMap::new()),
        };

        for lane in persister.lanes() {
            manager.lane(&lane).await;
        }
        manager
    }
}
