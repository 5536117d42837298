//! Task reservation domain types

use serde::{Deserialize, Serialize};

/// Identity a reservation was submitted under
///
/// Filled in upstream; the node scheduler only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserGroupInfo {
    /// Tenant name, the fairness unit for round-robin dispatch
    pub user: String,

    /// Group the tenant belongs to (carried through untouched)
    #[serde(default)]
    pub group: String,

    /// Priority class, lower values are dispatched first
    #[serde(default)]
    pub priority: i32,
}

impl UserGroupInfo {
    pub fn new(user: impl Into<String>, group: impl Into<String>, priority: i32) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
            priority,
        }
    }
}

/// A task reservation
///
/// Created by the transport layer, owned by a scheduler while queued and
/// handed to the executor exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Logical request this task belongs to
    pub request_id: String,

    /// Task identifier, unique within its request
    pub task_id: String,

    /// Submitting tenant
    pub user: UserGroupInfo,

    /// Application that submitted the request
    #[serde(default)]
    pub app_id: String,

    /// Opaque task description forwarded to the executor
    #[serde(default)]
    pub message: Vec<u8>,

    /// Request of the task whose completion launched this one
    #[serde(default)]
    pub previous_request_id: Option<String>,

    /// Task whose completion launched this one
    #[serde(default)]
    pub previous_task_id: Option<String>,
}

impl TaskSpec {
    /// Creates a reservation with no lineage
    pub fn new(
        request_id: impl Into<String>,
        task_id: impl Into<String>,
        user: UserGroupInfo,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            task_id: task_id.into(),
            user,
            app_id: String::new(),
            message: Vec::new(),
            previous_request_id: None,
            previous_task_id: None,
        }
    }

    /// Records which finished task freed the slot this task runs in
    pub fn stamp_lineage(&mut self, last_request_id: &str, last_task_id: &str) {
        self.previous_request_id = Some(last_request_id.to_string());
        self.previous_task_id = Some(last_task_id.to_string());
    }

    /// True when the task was launched on submission rather than by a completion
    pub fn launched_immediately(&self) -> bool {
        self.previous_request_id.is_none() && self.previous_task_id.is_none()
    }
}
