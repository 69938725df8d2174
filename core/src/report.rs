//! Task outcomes and the reporting port.

use std::process::ExitStatus;
use std::time::Duration;

use crate::generator::Task;
use crate::pool::PoolState;

/// How a single task ended. None of these stop the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// The process exited with status 0.
    Succeeded,
    /// The process exited unsuccessfully. `code` is `None` when it was
    /// ended by a signal.
    Failed { code: Option<i32> },
    /// The process outlived its deadline and was killed.
    TimedOut,
    /// The pool was stopped while the process was running.
    Cancelled,
}

impl TaskStatus {
    pub fn from_exit(status: ExitStatus) -> Self {
        if status.success() {
            TaskStatus::Succeeded
        } else {
            TaskStatus::Failed {
                code: status.code(),
            }
        }
    }
}

/// The terminal outcome of one task.
#[derive(Clone, Debug)]
pub struct TaskOutcome {
    pub task: Task,
    pub status: TaskStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Totals for a whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolSummary {
    /// The announced task count.
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: usize,
    pub elapsed: Duration,
    pub state: PoolState,
}

impl PoolSummary {
    /// Tasks that reached a terminal outcome.
    pub fn finished(&self) -> usize {
        self.succeeded + self.failed + self.timed_out + self.cancelled
    }
}

/// Receives progress from the worker pool.
///
/// Called concurrently from every worker; completion order is not the
/// generation order.
pub trait ReportingSink: Send + Sync {
    /// Called once, before any task starts.
    fn on_start(&self, _total: usize) {}

    /// Called right before the task's process is spawned.
    fn on_task_started(&self, _worker: usize, _task: &Task) {}

    fn on_task_finished(&self, worker: usize, outcome: &TaskOutcome);

    /// Called once, after the last outcome.
    fn on_finish(&self, _summary: &PoolSummary) {}
}
