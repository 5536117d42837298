//! Strict priority scheduler
//!
//! Queues are kept per priority class in ascending order. A freed slot always
//! goes to the head of the lowest-valued non-empty class, so sustained load at
//! a high priority starves lower ones.

use roost_core::domain::policy::SchedulingPolicy;
use roost_core::domain::task::TaskSpec;
use roost_core::dto::reservation::SchedulerSnapshot;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::error::Result;
use super::ledger::SlotLedger;
use super::{TaskScheduler, lock_state};
use crate::launcher::TaskLauncher;

struct PriorityState {
    ledger: SlotLedger,
    queues: BTreeMap<i32, VecDeque<TaskSpec>>,
}

/// Scheduler that launches tasks in strict priority order
pub struct PriorityTaskScheduler {
    state: Mutex<PriorityState>,
    launcher: Arc<dyn TaskLauncher>,
}

impl PriorityTaskScheduler {
    pub fn new(max_active_tasks: usize, launcher: Arc<dyn TaskLauncher>) -> Self {
        Self {
            state: Mutex::new(PriorityState {
                ledger: SlotLedger::new(max_active_tasks),
                queues: BTreeMap::new(),
            }),
            launcher,
        }
    }
}

impl TaskScheduler for PriorityTaskScheduler {
    fn submit_reservation(&self, spec: TaskSpec) -> Result<usize> {
        let mut state = lock_state(&self.state)?;
        let state = &mut *state;
        let priority = spec.user.priority;
        let queue = state.queues.entry(priority).or_default();

        if state.ledger.has_free_slot() {
            state.ledger.claim_slot()?;
            debug!(
                "Making task for request {} with priority {} runnable ({} of {} task slots currently filled)",
                spec.request_id,
                priority,
                state.ledger.active_tasks(),
                state.ledger.max_active_tasks()
            );
            self.launcher.launch(spec);
            return Ok(0);
        }

        debug!(
            "All {} task slots filled. Adding reservation for priority {}: {} already queued for that priority, {} queued in total",
            state.ledger.max_active_tasks(),
            priority,
            queue.len(),
            state.ledger.queued()
        );
        queue.push_back(spec);
        Ok(state.ledger.enqueue())
    }

    fn task_completed(
        &self,
        request_id: &str,
        last_task_request_id: &str,
        last_task_id: &str,
        _preferred_user: Option<&str>,
    ) -> Result<()> {
        let mut state = lock_state(&self.state)?;
        let state = &mut *state;

        if !state.ledger.has_backlog() {
            debug!(
                "Task for request {} completed and nothing is queued, freeing its slot",
                request_id
            );
            return state.ledger.release_slot();
        }

        let next = state
            .queues
            .iter_mut()
            .find_map(|(priority, queue)| queue.pop_front().map(|task| (*priority, task)));

        let Some((priority, mut task)) = next else {
            return Err(state.ledger.mismatch());
        };

        debug!(
            "Launching task for request {} (priority {})",
            task.request_id, priority
        );
        task.stamp_lineage(last_task_request_id, last_task_id);
        state.ledger.dequeue();
        self.launcher.launch(task);
        Ok(())
    }

    fn max_active_tasks(&self) -> usize {
        // Fixed at construction; a poisoned lock still holds a valid value.
        match self.state.lock() {
            Ok(state) => state.ledger.max_active_tasks(),
            Err(poisoned) => poisoned.into_inner().ledger.max_active_tasks(),
        }
    }

    fn policy(&self) -> SchedulingPolicy {
        SchedulingPolicy::Priority
    }

    fn snapshot(&self) -> Result<SchedulerSnapshot> {
        let state = lock_state(&self.state)?;
        Ok(state.ledger.snapshot(SchedulingPolicy::Priority))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::{ChannelLauncher, RunnableTasks};
    use crate::scheduler::SchedulerError;
    use roost_core::domain::task::UserGroupInfo;

    fn setup(max_active_tasks: usize) -> (PriorityTaskScheduler, RunnableTasks) {
        let (launcher, runnable) = ChannelLauncher::new();
        (
            PriorityTaskScheduler::new(max_active_tasks, Arc::new(launcher)),
            runnable,
        )
    }

    fn spec(request_id: &str, priority: i32) -> TaskSpec {
        TaskSpec::new(request_id, "0", UserGroupInfo::new("user", "", priority))
    }

    fn complete(scheduler: &PriorityTaskScheduler, last: &str) {
        scheduler
            .task_completed(last, last, "0", None)
            .expect("completion should succeed");
    }

    #[test]
    fn test_submit_into_free_capacity_launches() {
        let (scheduler, mut runnable) = setup(2);

        assert_eq!(scheduler.submit_reservation(spec("a", 1)).unwrap(), 0);
        assert_eq!(scheduler.submit_reservation(spec("b", 1)).unwrap(), 0);

        let launched = runnable.try_next_task().unwrap();
        assert_eq!(launched.request_id, "a");
        assert!(launched.launched_immediately());
        assert_eq!(runnable.try_next_task().unwrap().request_id, "b");

        let snapshot = scheduler.snapshot().unwrap();
        assert_eq!(snapshot.active_tasks, 2);
        assert_eq!(snapshot.queued_reservations, 0);
    }

    #[test]
    fn test_submit_without_capacity_returns_queue_depth() {
        let (scheduler, mut runnable) = setup(1);

        assert_eq!(scheduler.submit_reservation(spec("a", 1)).unwrap(), 0);
        assert_eq!(scheduler.submit_reservation(spec("b", 7)).unwrap(), 1);
        assert_eq!(scheduler.submit_reservation(spec("c", 2)).unwrap(), 2);

        assert_eq!(runnable.try_next_task().unwrap().request_id, "a");
        assert!(runnable.try_next_task().is_none());
    }

    #[test]
    fn test_lowest_priority_value_dispatched_first() {
        let (scheduler, mut runnable) = setup(1);
        scheduler.submit_reservation(spec("running", 0)).unwrap();
        scheduler.submit_reservation(spec("p5", 5)).unwrap();
        scheduler.submit_reservation(spec("p1", 1)).unwrap();
        scheduler.submit_reservation(spec("p3", 3)).unwrap();
        runnable.try_next_task().unwrap();

        complete(&scheduler, "running");
        assert_eq!(runnable.try_next_task().unwrap().request_id, "p1");
        complete(&scheduler, "p1");
        assert_eq!(runnable.try_next_task().unwrap().request_id, "p3");
        complete(&scheduler, "p3");
        assert_eq!(runnable.try_next_task().unwrap().request_id, "p5");
    }

    #[test]
    fn test_fifo_within_priority_class() {
        let (scheduler, mut runnable) = setup(1);
        scheduler.submit_reservation(spec("running", 2)).unwrap();
        for id in ["first", "second", "third"] {
            scheduler.submit_reservation(spec(id, 2)).unwrap();
        }
        runnable.try_next_task().unwrap();

        let mut order = Vec::new();
        for last in ["running", "first", "second"] {
            complete(&scheduler, last);
            order.push(runnable.try_next_task().unwrap().request_id);
        }
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_completion_stamps_lineage() {
        let (scheduler, mut runnable) = setup(1);
        scheduler.submit_reservation(spec("a", 1)).unwrap();
        scheduler.submit_reservation(spec("b", 1)).unwrap();
        runnable.try_next_task().unwrap();

        scheduler
            .task_completed("a", "req-a", "task-3", Some("ignored"))
            .unwrap();

        let launched = runnable.try_next_task().unwrap();
        assert_eq!(launched.previous_request_id.as_deref(), Some("req-a"));
        assert_eq!(launched.previous_task_id.as_deref(), Some("task-3"));

        let snapshot = scheduler.snapshot().unwrap();
        assert_eq!(snapshot.active_tasks, 1);
        assert_eq!(snapshot.queued_reservations, 0);
    }

    #[test]
    fn test_completion_without_backlog_frees_slot() {
        let (scheduler, mut runnable) = setup(1);
        scheduler.submit_reservation(spec("a", 1)).unwrap();
        complete(&scheduler, "a");

        assert_eq!(scheduler.snapshot().unwrap().active_tasks, 0);
        runnable.try_next_task().unwrap();
        assert!(runnable.try_next_task().is_none());

        // An emptied class is kept and reused.
        assert_eq!(scheduler.submit_reservation(spec("b", 1)).unwrap(), 0);
    }

    #[test]
    fn test_completion_with_no_active_task_is_fatal() {
        let (scheduler, _runnable) = setup(1);
        assert_eq!(
            scheduler.task_completed("x", "x", "0", None),
            Err(SchedulerError::CompletionWithoutActiveTask)
        );
    }

    #[test]
    fn test_queued_count_mismatch_is_fatal() {
        let (scheduler, _runnable) = setup(1);
        scheduler.submit_reservation(spec("a", 1)).unwrap();
        scheduler.state.lock().unwrap().ledger.enqueue();

        assert_eq!(
            scheduler.task_completed("a", "a", "0", None),
            Err(SchedulerError::QueuedCountMismatch { queued: 1 })
        );
    }

    #[test]
    fn test_idle_slot_with_backlog_is_fatal() {
        let (scheduler, _runnable) = setup(2);
        scheduler.state.lock().unwrap().ledger.enqueue();

        assert!(matches!(
            scheduler.submit_reservation(spec("a", 1)),
            Err(SchedulerError::IdleSlotWithBacklog { queued: 1, .. })
        ));
    }

    #[test]
    fn test_max_active_tasks_and_policy() {
        let (scheduler, _runnable) = setup(3);
        assert_eq!(scheduler.max_active_tasks(), 3);
        assert_eq!(scheduler.policy(), SchedulingPolicy::Priority);
    }

    fn assert_counts_agree(scheduler: &PriorityTaskScheduler) {
        let state = scheduler.state.lock().unwrap();
        let queued: usize = state.queues.values().map(VecDeque::len).sum();
        assert_eq!(queued, state.ledger.queued());
        if state.ledger.has_free_slot() {
            assert_eq!(queued, 0);
        }
    }

    #[test]
    fn test_queued_counter_matches_queue_lengths() {
        let (scheduler, mut runnable) = setup(2);

        for (request_id, priority) in [("a", 3), ("b", 1), ("c", 3), ("d", 0), ("e", 1)] {
            scheduler.submit_reservation(spec(request_id, priority)).unwrap();
            assert_counts_agree(&scheduler);
        }
        assert_eq!(scheduler.snapshot().unwrap().queued_reservations, 3);

        for _ in 0..5 {
            complete(&scheduler, "done");
            assert_counts_agree(&scheduler);
        }

        let launched: Vec<String> = std::iter::from_fn(|| runnable.try_next_task())
            .map(|task| task.request_id)
            .collect();
        assert_eq!(launched, vec!["a", "b", "d", "e", "c"]);
        assert_eq!(scheduler.snapshot().unwrap().active_tasks, 0);
    }
}
