use std::fs::File;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use log::{debug, warn};
use tokio::process::Command;

/// Exit code reported for a command that hit its deadline.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// How a supervised command ended.
#[derive(Debug)]
pub enum OutcomeKind {
    /// Ran to completion, with any exit code.
    Completed,
    /// Killed after the deadline expired.
    TimedOut(Duration),
    /// Never started; the OS error is kept for the operator.
    FailedToStart(std::io::Error),
}

/// What the orchestrator decides on. Nothing else inspects raw process errors.
#[derive(Debug)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub kind: OutcomeKind,
}

impl CommandOutcome {
    fn completed(exit_code: i32) -> Self {
        Self {
            exit_code,
            kind: OutcomeKind::Completed,
        }
    }

    fn timed_out(limit: Duration) -> Self {
        Self {
            exit_code: TIMEOUT_EXIT_CODE,
            kind: OutcomeKind::TimedOut(limit),
        }
    }

    fn failed_to_start(error: std::io::Error) -> Self {
        Self {
            exit_code: 0,
            kind: OutcomeKind::FailedToStart(error),
        }
    }
}

/// Runs a child process under an optional wall-clock deadline.
///
/// stdin is passed through. stdout and stderr go to the caller's streams
/// unless [`Supervisor::output_to`] redirects both to a file.
#[derive(Debug, Default)]
pub struct Supervisor {
    output: Option<File>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_to(file: File) -> Self {
        Self { output: Some(file) }
    }

    pub async fn run(
        &self,
        deadline: Option<Duration>,
        command: &str,
        args: &[String],
    ) -> CommandOutcome {
        let mut cmd = Command::new(command);
        cmd.args(args).stdin(Stdio::inherit()).kill_on_drop(true);
        match self.redirected() {
            Ok(Some((stdout, stderr))) => {
                cmd.stdout(stdout).stderr(stderr);
            }
            Ok(None) => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            Err(e) => return CommandOutcome::failed_to_start(e),
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return CommandOutcome::failed_to_start(e),
        };
        debug!("Started {command:?} (pid {:?})", child.id());

        let waited = match deadline {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    debug!("Deadline of {limit:?} expired, killing {command:?}");
                    // kill() also reaps the child.
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill timed out command {command:?}: {e}");
                    }
                    return CommandOutcome::timed_out(limit);
                }
            },
            None => child.wait().await,
        };

        match waited {
            Ok(status) => CommandOutcome::completed(exit_code(status)),
            Err(e) => {
                warn!("Failed waiting on {command:?}: {e}");
                CommandOutcome::completed(1)
            }
        }
    }

    fn redirected(&self) -> std::io::Result<Option<(Stdio, Stdio)>> {
        let Some(file) = &self.output else {
            return Ok(None);
        };
        Ok(Some((
            Stdio::from(file.try_clone()?),
            Stdio::from(file.try_clone()?),
        )))
    }
}

/// Exit code of a finished child, `128 + signal` if it was killed by one.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
