//! Reservation DTOs exchanged with the transport layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::policy::SchedulingPolicy;
use crate::domain::task::TaskSpec;

/// A task reservation offered to this node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReservation {
    pub spec: TaskSpec,
}

/// Reply to a reservation submission
///
/// `queue_depth` is 0 when the task launched immediately, otherwise the
/// number of reservations queued on the node after this one was added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub queue_depth: usize,
    pub launched: bool,
}

impl SubmitOutcome {
    pub fn from_queue_depth(queue_depth: usize) -> Self {
        Self {
            queue_depth,
            launched: queue_depth == 0,
        }
    }
}

/// Completion signal for a task that was running on this node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompleted {
    pub request_id: String,
    pub last_task_request_id: String,
    pub last_task_id: String,

    /// Tenant to favour for the freed slot (round-robin only)
    #[serde(default)]
    pub preferred_user: Option<String>,
}

/// Command accepted by a node monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeCommand {
    Submit(SubmitReservation),
    Complete(TaskCompleted),
}

/// Point-in-time view of a node scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    pub policy: SchedulingPolicy,
    pub max_active_tasks: usize,
    pub active_tasks: usize,
    pub queued_reservations: usize,
    pub taken_at: DateTime<Utc>,
}

impl SchedulerSnapshot {
    pub fn free_slots(&self) -> usize {
        self.max_active_tasks.saturating_sub(self.active_tasks)
    }
}
