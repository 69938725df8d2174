use std::io::Write;
use std::sync::OnceLock;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use interlace_common::config::Verbosity;
use interlace_common::{debug, warn};
use interlace_core::{PoolSummary, ReportingSink, TaskOutcome, TaskStatus};

use crate::terminal::print;

const TICK_STRINGS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];
const TEMPLATE: &str = "{spinner:.blue} [{elapsed_precise}] {bar:40.green/white} {pos}/{len} {msg}";

static BAR: OnceLock<ProgressBar> = OnceLock::new();

/// The shared progress bar. Hidden until [`start`] shows it.
pub fn bar() -> &'static ProgressBar {
    BAR.get_or_init(ProgressBar::hidden)
}

/// Sizes the bar to `total` tasks and draws it on stderr when `enabled`.
pub fn start(total: usize, enabled: bool) {
    let pb = bar();
    pb.set_length(total as u64);
    if !enabled {
        return;
    }

    let style = ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(TICK_STRINGS);
    pb.set_style(style);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(100));
}

/// Writes log lines to stdout without tearing the bar.
pub struct ProgressWriter;

impl Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        bar().suspend(|| std::io::stdout().lock().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stdout().flush()
    }
}

fn status_text(status: TaskStatus) -> String {
    match status {
        TaskStatus::Succeeded => "exit 0".to_string(),
        TaskStatus::Failed { code: Some(code) } => format!("exit {code}"),
        TaskStatus::Failed { code: None } => "killed by signal".to_string(),
        TaskStatus::TimedOut => "timed out".to_string(),
        TaskStatus::Cancelled => "cancelled".to_string(),
    }
}

/// One line per finished task for `--verbose`: the command and how it ended.
fn finished_line(outcome: &TaskOutcome) -> String {
    format!(
        "{} [{}, {:.2?}]",
        outcome.task.command,
        status_text(outcome.status),
        outcome.elapsed
    )
}

/// Reports pool progress on the terminal.
pub struct TerminalSink {
    verbosity: Verbosity,
    show_bar: bool,
}

impl TerminalSink {
    pub fn new(verbosity: Verbosity, show_bar: bool) -> Self {
        Self {
            verbosity,
            show_bar,
        }
    }

    fn verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }
}

impl ReportingSink for TerminalSink {
    fn on_start(&self, total: usize) {
        start(total, self.show_bar);
    }

    fn on_task_finished(&self, worker: usize, outcome: &TaskOutcome) {
        bar().inc(1);

        let stdout = outcome.stdout.trim();
        if !stdout.is_empty() {
            print::print(stdout);
        }

        let command = &outcome.task.command;
        match outcome.status {
            TaskStatus::Succeeded => {}
            TaskStatus::Failed { code: Some(code) } => {
                warn!("Command exited with status {code}: {command}")
            }
            TaskStatus::Failed { code: None } => warn!("Command was killed by a signal: {command}"),
            TaskStatus::TimedOut => warn!(
                "Command timed out after {:.1?}: {command}",
                outcome.elapsed
            ),
            TaskStatus::Cancelled => debug!("Command cancelled: {command}"),
        }

        if self.verbose() {
            debug!(worker, "{}", finished_line(outcome));
            let stderr = outcome.stderr.trim();
            if !stderr.is_empty() {
                debug!(worker, "stderr of {command}:\n{stderr}");
            }
        }
    }

    fn on_finish(&self, summary: &PoolSummary) {
        bar().finish_and_clear();
        if self.verbosity != Verbosity::Silent {
            print::summary(summary);
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use interlace_core::Task;
    use std::sync::Arc;

    fn outcome(command: &str, status: TaskStatus) -> TaskOutcome {
        TaskOutcome {
            task: Task {
                id: 0,
                command: command.to_string(),
                target: Arc::from("a"),
                template: Arc::from(command),
                repeat_index: 0,
            },
            status,
            stdout: String::new(),
            stderr: String::new(),
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn verbose_line_shows_successful_exit_status() {
        let line = finished_line(&outcome("echo a", TaskStatus::Succeeded));
        assert_eq!(line, "echo a [exit 0, 1.50s]");
    }

    #[test]
    fn verbose_line_distinguishes_every_ending() {
        let cases = [
            (TaskStatus::Failed { code: Some(2) }, "exit 2"),
            (TaskStatus::Failed { code: None }, "killed by signal"),
            (TaskStatus::TimedOut, "timed out"),
            (TaskStatus::Cancelled, "cancelled"),
        ];
        for (status, expected) in cases {
            assert!(finished_line(&outcome("x", status)).contains(expected));
        }
    }
}
