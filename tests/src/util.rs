#![cfg(test)]
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use interlace_core::{ReportingSink, Task, TaskGenerator, TaskOutcome};
use tempfile::TempDir;
use tokio::sync::watch;

/// Records outcomes and the highest number of tasks that were live at once.
#[derive(Default)]
pub struct Recorder {
    pub announced: AtomicUsize,
    live: AtomicUsize,
    pub peak: AtomicUsize,
    outcomes: Mutex<Vec<TaskOutcome>>,
}

impl Recorder {
    /// Outcomes in generation order.
    pub fn outcomes(&self) -> Vec<TaskOutcome> {
        let mut outcomes = self.outcomes.lock().unwrap().clone();
        outcomes.sort_by_key(|outcome| outcome.task.id);
        outcomes
    }
}

impl ReportingSink for Recorder {
    fn on_start(&self, total: usize) {
        self.announced.store(total, Ordering::SeqCst);
    }

    fn on_task_started(&self, _worker: usize, _task: &Task) {
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(live, Ordering::SeqCst);
    }

    fn on_task_finished(&self, _worker: usize, outcome: &TaskOutcome) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}

pub fn commands(generator: TaskGenerator) -> Vec<String> {
    generator.into_iter().map(|task| task.command).collect()
}

pub fn no_stop() -> watch::Receiver<bool> {
    let (_tx, rx) = watch::channel(false);
    rx
}

pub fn write_list(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    path
}
