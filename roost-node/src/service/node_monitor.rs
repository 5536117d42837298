//! Node monitor service
//!
//! Entry point the transport layer calls into. Translates reservation DTOs
//! into scheduler calls and reports fatal faults with the node's identity.

use anyhow::{Context, Result};
use roost_core::dto::reservation::{
    NodeCommand, SchedulerSnapshot, SubmitOutcome, SubmitReservation, TaskCompleted,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::scheduler::TaskScheduler;

/// Admission facade for one node
pub struct NodeMonitor {
    node_id: String,
    scheduler: Arc<dyn TaskScheduler>,
}

impl NodeMonitor {
    pub fn new(node_id: String, scheduler: Arc<dyn TaskScheduler>) -> Self {
        info!(
            "Node monitor {} ready ({} scheduler, {} task slots)",
            node_id,
            scheduler.policy(),
            scheduler.max_active_tasks()
        );
        Self { node_id, scheduler }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Offers a reservation to the node
    pub fn submit(&self, request: SubmitReservation) -> Result<SubmitOutcome> {
        let request_id = request.spec.request_id.clone();
        let task_id = request.spec.task_id.clone();

        let queue_depth = self
            .scheduler
            .submit_reservation(request.spec)
            .with_context(|| {
                format!(
                    "Node {} failed to admit task {} of request {}",
                    self.node_id, task_id, request_id
                )
            })?;

        debug!(
            "Node {} admitted task {} of request {} (queue depth {})",
            self.node_id, task_id, request_id, queue_depth
        );
        Ok(SubmitOutcome::from_queue_depth(queue_depth))
    }

    /// Reports that a task running on this node finished
    pub fn complete(&self, completion: TaskCompleted) -> Result<()> {
        self.scheduler
            .task_completed(
                &completion.request_id,
                &completion.last_task_request_id,
                &completion.last_task_id,
                completion.preferred_user.as_deref(),
            )
            .with_context(|| {
                format!(
                    "Node {} failed to handle completion of task {} of request {}",
                    self.node_id, completion.last_task_id, completion.last_task_request_id
                )
            })?;

        debug!(
            "Node {} handled completion of task {} of request {}",
            self.node_id, completion.last_task_id, completion.last_task_request_id
        );
        Ok(())
    }

    /// Applies a single command, returning the outcome for submissions
    pub fn handle(&self, command: NodeCommand) -> Result<Option<SubmitOutcome>> {
        match command {
            NodeCommand::Submit(request) => self.submit(request).map(Some),
            NodeCommand::Complete(completion) => self.complete(completion).map(|_| None),
        }
    }

    pub fn snapshot(&self) -> Result<SchedulerSnapshot> {
        self.scheduler
            .snapshot()
            .with_context(|| format!("Node {} scheduler is unusable", self.node_id))
    }
}
