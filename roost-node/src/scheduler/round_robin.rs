//! Round-robin scheduler over per-tenant queues
//!
//! Every tenant ever seen keeps a permanent place in the rotation, even after
//! its queue empties, so rotation positions stay stable. A freed slot goes to
//! the first tenant with queued work at or after the rotation cursor.
//!
//! A completion may name a preferred tenant. If that tenant has queued work it
//! is served first and the cursor stays where it was.

use roost_core::domain::policy::SchedulingPolicy;
use roost_core::domain::task::TaskSpec;
use roost_core::dto::reservation::SchedulerSnapshot;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::error::Result;
use super::ledger::SlotLedger;
use super::{TaskScheduler, lock_state};
use crate::launcher::TaskLauncher;

struct TenantQueue {
    user: String,
    reservations: VecDeque<TaskSpec>,
}

struct RoundRobinState {
    ledger: SlotLedger,
    /// Append-only rotation order
    roster: Vec<TenantQueue>,
    positions: HashMap<String, usize>,
    /// Position of the tenant due the next turn, taken modulo the roster size
    cursor: usize,
}

impl RoundRobinState {
    fn position_of(&mut self, user: &str) -> usize {
        if let Some(&position) = self.positions.get(user) {
            return position;
        }
        let position = self.roster.len();
        self.roster.push(TenantQueue {
            user: user.to_string(),
            reservations: VecDeque::new(),
        });
        self.positions.insert(user.to_string(), position);
        position
    }

    fn take_from(&mut self, position: usize) -> Option<TaskSpec> {
        let tenant = &mut self.roster[position];
        match tenant.reservations.pop_front() {
            Some(task) => {
                debug!(
                    "Task for user {}, request {} now runnable",
                    tenant.user, task.request_id
                );
                Some(task)
            }
            None => {
                debug!("Skipping user {} that has no runnable tasks", tenant.user);
                None
            }
        }
    }

    /// Picks the next reservation, advancing the cursor unless the preferred
    /// tenant was served
    fn next_reservation(&mut self, preferred_user: Option<&str>) -> Option<TaskSpec> {
        if let Some(&position) = preferred_user.and_then(|user| self.positions.get(user)) {
            if let Some(task) = self.take_from(position) {
                return Some(task);
            }
        }

        let tenants = self.roster.len();
        for offset in 0..tenants {
            let position = (self.cursor + offset) % tenants;
            if let Some(task) = self.take_from(position) {
                self.cursor = position + 1;
                return Some(task);
            }
        }
        None
    }
}

/// Scheduler that gives each tenant a fair rotating turn
pub struct RoundRobinTaskScheduler {
    state: Mutex<RoundRobinState>,
    launcher: Arc<dyn TaskLauncher>,
}

impl RoundRobinTaskScheduler {
    pub fn new(max_active_tasks: usize, launcher: Arc<dyn TaskLauncher>) -> Self {
        Self {
            state: Mutex::new(RoundRobinState {
                ledger: SlotLedger::new(max_active_tasks),
                roster: Vec::new(),
                positions: HashMap::new(),
                cursor: 0,
            }),
            launcher,
        }
    }
}

impl TaskScheduler for RoundRobinTaskScheduler {
    fn submit_reservation(&self, spec: TaskSpec) -> Result<usize> {
        let mut state = lock_state(&self.state)?;
        let state = &mut *state;
        let position = state.position_of(&spec.user.user);

        if state.ledger.has_free_slot() {
            state.ledger.claim_slot()?;
            // This tenant just had its turn.
            state.cursor = position + 1;
            debug!(
                "Making task for request {} runnable ({} of {} task slots currently filled)",
                spec.request_id,
                state.ledger.active_tasks(),
                state.ledger.max_active_tasks()
            );
            self.launcher.launch(spec);
            return Ok(0);
        }

        let tenant = &mut state.roster[position];
        debug!(
            "All {} task slots filled. Adding reservation for user {}: {} already queued for user, {} queued in total",
            state.ledger.max_active_tasks(),
            tenant.user,
            tenant.reservations.len(),
            state.ledger.queued()
        );
        tenant.reservations.push_back(spec);
        Ok(state.ledger.enqueue())
    }

    fn task_completed(
        &self,
        request_id: &str,
        last_task_request_id: &str,
        last_task_id: &str,
        preferred_user: Option<&str>,
    ) -> Result<()> {
        let mut state = lock_state(&self.state)?;

        if !state.ledger.has_backlog() {
            debug!(
                "Task for request {} completed and nothing is queued, freeing its slot",
                request_id
            );
            return state.ledger.release_slot();
        }

        let Some(mut task) = state.next_reservation(preferred_user) else {
            return Err(state.ledger.mismatch());
        };
        task.stamp_lineage(last_task_request_id, last_task_id);
        state.ledger.dequeue();
        self.launcher.launch(task);
        Ok(())
    }

    fn max_active_tasks(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.ledger.max_active_tasks(),
            Err(poisoned) => poisoned.into_inner().ledger.max_active_tasks(),
        }
    }

    fn policy(&self) -> SchedulingPolicy {
        SchedulingPolicy::RoundRobin
    }

    fn snapshot(&self) -> Result<SchedulerSnapshot> {
        let state = lock_state(&self.state)?;
        Ok(state.ledger.snapshot(SchedulingPolicy::RoundRobin))
    }
}
