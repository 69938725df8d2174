//! Process execution with a hard deadline.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use interlace_common::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::PoolError;
use crate::generator::Task;
use crate::report::{TaskOutcome, TaskStatus};

/// How long pipe readers may keep draining once the process is gone.
///
/// A background grandchild can hold the pipe open after its parent exited.
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

/// Runs one task to a terminal outcome.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `task`, killing it once `timeout` elapses or `halt` turns true.
    ///
    /// Only failing to start the process at all is an error.
    async fn run(
        &self,
        task: &Task,
        timeout: Duration,
        halt: watch::Receiver<bool>,
    ) -> Result<TaskOutcome, PoolError>;
}

/// Runs commands through the platform shell.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShellRunner;

enum Ending {
    Exited(std::io::Result<std::process::ExitStatus>),
    Deadline,
    Halted,
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        task: &Task,
        timeout: Duration,
        mut halt: watch::Receiver<bool>,
    ) -> Result<TaskOutcome, PoolError> {
        let started = Instant::now();
        let mut child = shell_command(&task.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PoolError::Spawn {
                command: task.command.clone(),
                source,
            })?;

        let mut group = ProcessGroup::new(child.id());

        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let ending = tokio::select! {
            exit = child.wait() => Ending::Exited(exit),
            _ = tokio::time::sleep(timeout) => Ending::Deadline,
            _ = halted(&mut halt) => Ending::Halted,
        };

        let status = match ending {
            Ending::Exited(Ok(exit)) => {
                group.release();
                TaskStatus::from_exit(exit)
            }
            Ending::Exited(Err(e)) => {
                warn!("Lost track of '{}': {e}", task.command);
                group.kill();
                kill(&mut child).await;
                TaskStatus::Failed { code: None }
            }
            Ending::Deadline => {
                group.kill();
                kill(&mut child).await;
                TaskStatus::TimedOut
            }
            Ending::Halted => {
                group.kill();
                kill(&mut child).await;
                TaskStatus::Cancelled
            }
        };

        let (stdout, stderr) = tokio::join!(collect(stdout), collect(stderr));

        Ok(TaskOutcome {
            task: task.clone(),
            status,
            stdout,
            stderr,
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).process_group(0);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Resolves once `halt` is true. Never resolves if the sender is gone.
async fn halted(halt: &mut watch::Receiver<bool>) {
    if halt.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// The process group a task's shell leads, so everything the command line
/// started can be killed together.
///
/// Dropping it while still held kills the group, which covers workers that
/// are aborted mid-task.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    /// The shell exited on its own; leave whatever it backgrounded alone.
    fn release(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; an id that no longer names a group
    // makes it fail with ESRCH.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        debug!(
            "killpg {pgid} failed: {}",
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

/// Forcibly terminates the process and reaps it.
async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!("kill failed, process already gone: {e}");
    }
}

fn spawn_reader<R>(mut pipe: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf).await;
        buf
    })
}

async fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    let Some(mut handle) = reader else {
        return String::new();
    };
    match tokio::time::timeout(OUTPUT_GRACE, &mut handle).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(_)) => String::new(),
        Err(_elapsed) => {
            handle.abort();
            String::new()
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
