//! Node configuration
//!
//! Defines the configurable parameters of a node: its identity, how many
//! tasks may run at once, and which dispatch policy to use.

use roost_core::domain::policy::SchedulingPolicy;

/// Default number of concurrently running tasks
const DEFAULT_MAX_ACTIVE_TASKS: usize = 4;

/// Node configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this node
    pub node_id: String,

    /// Maximum number of tasks running at once
    pub max_active_tasks: usize,

    /// Dispatch policy for queued reservations
    pub policy: SchedulingPolicy,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(node_id: String) -> Self {
        Self {
            node_id,
            max_active_tasks: DEFAULT_MAX_ACTIVE_TASKS,
            policy: SchedulingPolicy::RoundRobin,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - NODE_ID (optional, default: random UUID)
    /// - MAX_ACTIVE_TASKS (optional, default: 4)
    /// - TASK_SCHEDULER (optional, `priority` or `round_robin`, default: round_robin)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let node_id = lookup("NODE_ID").unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let max_active_tasks = match lookup("MAX_ACTIVE_TASKS") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                anyhow::anyhow!("MAX_ACTIVE_TASKS must be a non-negative integer, got {raw:?}: {e}")
            })?,
            None => DEFAULT_MAX_ACTIVE_TASKS,
        };

        let policy = match lookup("TASK_SCHEDULER") {
            Some(raw) => raw.parse::<SchedulingPolicy>()?,
            None => SchedulingPolicy::RoundRobin,
        };

        Ok(Self {
            node_id,
            max_active_tasks,
            policy,
        })
    }

    pub fn with_max_active_tasks(mut self, max_active_tasks: usize) -> Self {
        self.max_active_tasks = max_active_tasks;
        self
    }

    pub fn with_policy(mut self, policy: SchedulingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.node_id.is_empty() {
            anyhow::bail!("node_id cannot be empty");
        }

        if self.max_active_tasks == 0 {
            anyhow::bail!("max_active_tasks must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}
