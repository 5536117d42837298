//! Scheduler layer for the node
//!
//! Decides which queued task reservation gets the next free execution slot.
//! Two policies share one interface:
//! - `PriorityTaskScheduler`: lowest priority class first, FIFO within a class
//! - `RoundRobinTaskScheduler`: rotating turns across tenants, FIFO within a tenant
//!
//! Each call runs its whole decide-and-mutate-dispatch step under one lock per
//! instance, so the executor sees tasks in the order they were picked.

mod error;
mod ledger;
mod priority;
mod round_robin;

pub use error::{Result, SchedulerError};
pub use priority::PriorityTaskScheduler;
pub use round_robin::RoundRobinTaskScheduler;

use roost_core::domain::policy::SchedulingPolicy;
use roost_core::domain::task::TaskSpec;
use roost_core::dto::reservation::SchedulerSnapshot;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info};

use crate::launcher::TaskLauncher;

/// Admission and dispatch contract for a node
pub trait TaskScheduler: Send + Sync {
    /// Accepts a reservation
    ///
    /// Launches it right away when a slot is free and returns 0. Otherwise
    /// queues it and returns the number of reservations now queued.
    fn submit_reservation(&self, spec: TaskSpec) -> Result<usize>;

    /// Handles the completion of a running task
    ///
    /// Reuses the freed slot for the next queued reservation, stamping it with
    /// the finished task's ids, or frees the slot when nothing is queued.
    /// `preferred_user` is a hint only the round-robin policy reads.
    fn task_completed(
        &self,
        request_id: &str,
        last_task_request_id: &str,
        last_task_id: &str,
        preferred_user: Option<&str>,
    ) -> Result<()>;

    /// Number of tasks allowed to run at once
    fn max_active_tasks(&self) -> usize;

    fn policy(&self) -> SchedulingPolicy;

    fn snapshot(&self) -> Result<SchedulerSnapshot>;
}

/// Creates the scheduler for `policy`
pub fn build_scheduler(
    policy: SchedulingPolicy,
    max_active_tasks: usize,
    launcher: Arc<dyn TaskLauncher>,
) -> Arc<dyn TaskScheduler> {
    info!(
        "Creating {} scheduler with {} task slots",
        policy, max_active_tasks
    );
    match policy {
        SchedulingPolicy::Priority => {
            Arc::new(PriorityTaskScheduler::new(max_active_tasks, launcher))
        }
        SchedulingPolicy::RoundRobin => {
            Arc::new(RoundRobinTaskScheduler::new(max_active_tasks, launcher))
        }
    }
}

pub(crate) fn lock_state<T>(state: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    state.lock().map_err(|_| {
        error!("Scheduler lock poisoned by an earlier panic");
        SchedulerError::LockPoisoned
    })
}
