//! Scheduler fault types

use thiserror::Error;

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Faults a node scheduler can report
///
/// None of these come from bad input. Each one means the scheduler's own
/// bookkeeping is broken, so the instance must not be used afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// A slot was free while reservations were still queued
    #[error(
        "{active_tasks} of {max_active_tasks} slots filled but {queued} reservations queued; \
         slots should only be free when nothing is queued"
    )]
    IdleSlotWithBacklog {
        active_tasks: usize,
        max_active_tasks: usize,
        queued: usize,
    },

    /// The queued counter is positive but every queue is empty
    #[error("{queued} reservations counted as queued but no queued tasks found")]
    QueuedCountMismatch { queued: usize },

    /// A completion arrived while no slot was occupied
    #[error("task completion reported with no active tasks")]
    CompletionWithoutActiveTask,

    /// A previous call panicked while holding the scheduler lock
    #[error("scheduler lock poisoned")]
    LockPoisoned,
}
