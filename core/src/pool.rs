//! # Worker Pool
//!
//! A fixed number of workers drain one shared [`Tasks`] cursor. Each worker
//! runs one process at a time, so no more than `workers` processes are ever
//! alive at once.
//!
//! Lifecycle: `Idle` → `Running` → `Draining` (stream exhausted, in-flight
//! tasks finishing) → `Done`, or `Cancelled` when a stop signal or a fatal
//! spawn error ends the run early.

mod runner;

pub use runner::{CommandRunner, ShellRunner};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use interlace_common::config::Config;
use interlace_common::{debug, error, warn};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};

use crate::generator::{Task, TaskGenerator, Tasks};
use crate::report::{PoolSummary, ReportingSink, TaskStatus};

/// Time given to in-flight tasks after a stop signal before workers are aborted.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// A failure that ends the whole run.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("could not spawn '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolState {
    Idle,
    Running,
    Draining,
    Done,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolSettings {
    pub workers: usize,
    /// Hard deadline per task, counted from process spawn.
    pub timeout: Duration,
    pub grace: Duration,
}

impl PoolSettings {
    pub fn new(workers: usize, timeout: Duration) -> Self {
        Self {
            workers: workers.max(1),
            timeout,
            grace: DEFAULT_GRACE,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

impl From<&Config> for PoolSettings {
    fn from(cfg: &Config) -> Self {
        Self::new(cfg.threads, cfg.timeout)
    }
}

#[derive(Debug, Default)]
struct Tally {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    timed_out: AtomicUsize,
    cancelled: AtomicUsize,
}

impl Tally {
    fn record(&self, status: &TaskStatus) {
        let counter = match status {
            TaskStatus::Succeeded => &self.succeeded,
            TaskStatus::Failed { .. } => &self.failed,
            TaskStatus::TimedOut => &self.timed_out,
            TaskStatus::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn summary(&self, total: usize, elapsed: Duration, state: PoolState) -> PoolSummary {
        PoolSummary {
            total,
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            elapsed,
            state,
        }
    }
}

/// Everything the workers of one run share.
struct Shared<R> {
    tasks: Mutex<Tasks>,
    runner: Arc<R>,
    sink: Arc<dyn ReportingSink>,
    tally: Tally,
    state: Arc<Mutex<PoolState>>,
    halt: watch::Sender<bool>,
    timeout: Duration,
}

impl<R> Shared<R> {
    /// Advances the shared cursor. Two workers never get the same task.
    fn next_task(&self) -> Option<Task> {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()
    }

    fn mark_draining(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == PoolState::Running {
            *state = PoolState::Draining;
            debug!("Task stream exhausted, waiting for running tasks");
        }
    }
}

pub struct WorkerPool<R = ShellRunner> {
    settings: PoolSettings,
    runner: Arc<R>,
    state: Arc<Mutex<PoolState>>,
}

impl WorkerPool<ShellRunner> {
    pub fn new(settings: PoolSettings) -> Self {
        Self::with_runner(settings, ShellRunner)
    }
}

impl<R: CommandRunner + 'static> WorkerPool<R> {
    pub fn with_runner(settings: PoolSettings, runner: R) -> Self {
        Self {
            settings,
            runner: Arc::new(runner),
            state: Arc::new(Mutex::new(PoolState::Idle)),
        }
    }

    pub fn state(&self) -> PoolState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: PoolState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Runs every task the generator produces.
    ///
    /// Returns once the stream is exhausted and every dispatched task has an
    /// outcome, or once a stop signal on `stop` has been honoured. Task
    /// failures and timeouts are reported to `sink` and never end the run;
    /// only a process that cannot be spawned does.
    pub async fn run(
        &self,
        generator: TaskGenerator,
        sink: Arc<dyn ReportingSink>,
        mut stop: watch::Receiver<bool>,
    ) -> Result<PoolSummary, PoolError> {
        let started = Instant::now();
        let tasks = generator.into_iter();
        let total = tasks.total();
        sink.on_start(total);

        let (halt, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            tasks: Mutex::new(tasks),
            runner: self.runner.clone(),
            sink: sink.clone(),
            tally: Tally::default(),
            state: self.state.clone(),
            halt,
            timeout: self.settings.timeout,
        });

        self.set_state(PoolState::Running);
        debug!(
            "Starting {} workers for {total} tasks, timeout {:?}",
            self.settings.workers, self.settings.timeout
        );

        let mut workers = JoinSet::new();
        for id in 0..self.settings.workers {
            workers.spawn(worker(id, shared.clone()));
        }

        let mut fatal: Option<PoolError> = None;
        let mut watching_stop = true;
        let mut cancelled = *stop.borrow_and_update();

        while !cancelled {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(result) => absorb(result, &mut fatal),
                    None => break,
                },
                changed = stop.changed(), if watching_stop => match changed {
                    Ok(()) => cancelled = *stop.borrow_and_update(),
                    Err(_) => watching_stop = false,
                },
            }
        }

        if cancelled {
            warn!("Stop requested, terminating running tasks");
            self.set_state(PoolState::Cancelled);
            shared.halt.send_replace(true);

            let drained = tokio::time::timeout(self.settings.grace, async {
                while let Some(result) = workers.join_next().await {
                    absorb(result, &mut fatal);
                }
            })
            .await;

            if drained.is_err() {
                warn!("Workers did not stop within {:?}, aborting", self.settings.grace);
                workers.shutdown().await;
            }
        } else if fatal.is_some() {
            self.set_state(PoolState::Cancelled);
        } else {
            self.set_state(PoolState::Done);
        }

        let summary = shared.tally.summary(total, started.elapsed(), self.state());
        sink.on_finish(&summary);

        match fatal {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

async fn worker<R: CommandRunner>(id: usize, shared: Arc<Shared<R>>) -> Result<(), PoolError> {
    let halt = shared.halt.subscribe();

    loop {
        if *halt.borrow() {
            break;
        }
        let Some(task) = shared.next_task() else {
            shared.mark_draining();
            break;
        };

        shared.sink.on_task_started(id, &task);
        debug!(worker = id, host = %task.target, "{}", task.command);

        let outcome = match shared.runner.run(&task, shared.timeout, halt.clone()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                shared.halt.send_replace(true);
                return Err(e);
            }
        };

        debug!(worker = id, elapsed = ?outcome.elapsed, "{:?}", outcome.status);
        shared.tally.record(&outcome.status);
        shared.sink.on_task_finished(id, &outcome);
    }

    Ok(())
}

fn absorb(result: Result<Result<(), PoolError>, JoinError>, fatal: &mut Option<PoolError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("{e}");
            if fatal.is_none() {
                *fatal = Some(e);
            }
        }
        Err(e) if e.is_cancelled() => {}
        Err(e) => error!("Worker crashed: {e}"),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
