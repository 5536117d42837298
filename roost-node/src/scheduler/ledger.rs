//! Slot and backlog counters shared by every policy

use chrono::Utc;
use roost_core::domain::policy::SchedulingPolicy;
use roost_core::dto::reservation::SchedulerSnapshot;
use tracing::error;

use super::error::{Result, SchedulerError};

/// Counters a scheduler keeps next to its queues
///
/// Invariant: `active_tasks < max_active_tasks` implies `queued_reservations == 0`.
#[derive(Debug)]
pub(crate) struct SlotLedger {
    max_active_tasks: usize,
    active_tasks: usize,
    queued_reservations: usize,
}

impl SlotLedger {
    pub fn new(max_active_tasks: usize) -> Self {
        Self {
            max_active_tasks,
            active_tasks: 0,
            queued_reservations: 0,
        }
    }

    pub fn max_active_tasks(&self) -> usize {
        self.max_active_tasks
    }

    pub fn active_tasks(&self) -> usize {
        self.active_tasks
    }

    pub fn queued(&self) -> usize {
        self.queued_reservations
    }

    pub fn has_free_slot(&self) -> bool {
        self.active_tasks < self.max_active_tasks
    }

    pub fn has_backlog(&self) -> bool {
        self.queued_reservations > 0
    }

    /// Takes a free slot for a reservation that launches on submission
    pub fn claim_slot(&mut self) -> Result<()> {
        if self.queued_reservations > 0 {
            let err = SchedulerError::IdleSlotWithBacklog {
                active_tasks: self.active_tasks,
                max_active_tasks: self.max_active_tasks,
                queued: self.queued_reservations,
            };
            error!("{}", err);
            return Err(err);
        }
        self.active_tasks += 1;
        Ok(())
    }

    /// Gives a slot back after a completion with nothing queued
    pub fn release_slot(&mut self) -> Result<()> {
        if self.active_tasks == 0 {
            let err = SchedulerError::CompletionWithoutActiveTask;
            error!("{}", err);
            return Err(err);
        }
        self.active_tasks -= 1;
        Ok(())
    }

    /// Counts a newly queued reservation, returning the new backlog
    pub fn enqueue(&mut self) -> usize {
        self.queued_reservations += 1;
        self.queued_reservations
    }

    /// Counts a reservation leaving the backlog for a reused slot
    pub fn dequeue(&mut self) {
        self.queued_reservations -= 1;
    }

    pub fn mismatch(&self) -> SchedulerError {
        let err = SchedulerError::QueuedCountMismatch {
            queued: self.queued_reservations,
        };
        error!("{}", err);
        err
    }

    pub fn snapshot(&self, policy: SchedulingPolicy) -> SchedulerSnapshot {
        SchedulerSnapshot {
            policy,
            max_active_tasks: self.max_active_tasks,
            active_tasks: self.active_tasks,
            queued_reservations: self.queued_reservations,
            taken_at: Utc::now(),
        }
    }
}
