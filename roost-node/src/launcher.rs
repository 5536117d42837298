//! Executor hand-off
//!
//! A scheduler hands each dispatched reservation to a `TaskLauncher` while
//! still holding its lock.

use roost_core::domain::task::TaskSpec;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Receives tasks that are cleared to run
///
/// `launch` runs under the scheduler lock. Implementations must return
/// without blocking and must never call back into the scheduler.
pub trait TaskLauncher: Send + Sync {
    /// Makes a task runnable. Fire-and-forget.
    fn launch(&self, task: TaskSpec);
}

/// Launcher that queues runnable tasks on an unbounded channel
///
/// The executor side drains the paired `RunnableTasks`.
#[derive(Clone)]
pub struct ChannelLauncher {
    sender: mpsc::UnboundedSender<TaskSpec>,
}

impl ChannelLauncher {
    /// Creates a launcher and the receiver the executor reads from
    pub fn new() -> (Self, RunnableTasks) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, RunnableTasks { receiver })
    }
}

impl TaskLauncher for ChannelLauncher {
    fn launch(&self, task: TaskSpec) {
        debug!(
            "Task {} of request {} is runnable",
            task.task_id, task.request_id
        );
        if let Err(mpsc::error::SendError(task)) = self.sender.send(task) {
            warn!(
                "Executor is gone, dropping task {} of request {}",
                task.task_id, task.request_id
            );
        }
    }
}

/// Executor side of a `ChannelLauncher`
pub struct RunnableTasks {
    receiver: mpsc::UnboundedReceiver<TaskSpec>,
}

impl RunnableTasks {
    /// Waits for the next runnable task
    ///
    /// Returns `None` once every launcher has been dropped and the queue is drained.
    pub async fn next_task(&mut self) -> Option<TaskSpec> {
        self.receiver.recv().await
    }

    /// Returns a runnable task if one is waiting
    pub fn try_next_task(&mut self) -> Option<TaskSpec> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_core::domain::task::UserGroupInfo;

    fn task(request_id: &str) -> TaskSpec {
        TaskSpec::new(request_id, "0", UserGroupInfo::new("alice", "", 0))
    }

    #[tokio::test]
    async fn test_launched_tasks_arrive_in_order() {
        let (launcher, mut runnable) = ChannelLauncher::new();
        launcher.launch(task("a"));
        launcher.launch(task("b"));

        assert_eq!(runnable.next_task().await.unwrap().request_id, "a");
        assert_eq!(runnable.next_task().await.unwrap().request_id, "b");
        assert!(runnable.try_next_task().is_none());
    }

    #[tokio::test]
    async fn test_receiver_ends_when_launchers_drop() {
        let (launcher, mut runnable) = ChannelLauncher::new();
        launcher.launch(task("a"));
        drop(launcher);

        assert!(runnable.next_task().await.is_some());
        assert!(runnable.next_task().await.is_none());
    }

    #[test]
    fn test_launch_after_executor_gone_does_not_panic() {
        let (launcher, runnable) = ChannelLauncher::new();
        drop(runnable);
        launcher.launch(task("a"));
    }
}
