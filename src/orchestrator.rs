//! Sequencing of "set running" → "run command" → "set final status".
//!
//! Reporting is best-effort throughout: a missing client, a missing commit or
//! a failed API call never changes whether the command runs or which exit
//! code the process ends with.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info};

use crate::commit::CommitResolver;
use crate::diagnostics::DiagnosticSink;
use crate::error::{CiStatusError, Result};
use crate::executor::{OutcomeKind, Supervisor, TIMEOUT_EXIT_CODE};
use crate::forge::{ForgeClient, ForgeDetector, ForgeKind, State, StatusOpts};
use crate::git::Git;

/// Description sent with the `error` status after a timeout.
pub const TIMEOUT_DESCRIPTION: &str = "Timed out";

/// Exit code when the command could not be started.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptions {
    pub pending: String,
    pub success: String,
    pub failure: String,
}

impl Default for Descriptions {
    fn default() -> Self {
        Self {
            pending: "Running...".to_string(),
            success: "Passed".to_string(),
            failure: "Failed".to_string(),
        }
    }
}

/// Where to send statuses, if anywhere.
pub struct StatusReporter<'a> {
    client: Option<Box<dyn ForgeClient>>,
    commit: Option<String>,
    context: String,
    target_url: Option<String>,
    sink: &'a dyn DiagnosticSink,
    noop_reported: AtomicBool,
}

/// Inputs for [`StatusReporter::connect`].
pub struct ReportTarget<'a, F> {
    /// Whether the `CI` gate is open.
    pub in_ci: bool,
    pub forge: Option<ForgeKind>,
    pub detector: &'a ForgeDetector,
    pub commits: &'a CommitResolver<F>,
    pub git: &'a Git,
}

impl<'a> StatusReporter<'a> {
    pub fn new(
        client: Option<Box<dyn ForgeClient>>,
        commit: Option<String>,
        context: impl Into<String>,
        target_url: Option<String>,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            client,
            commit: commit.filter(|c| !c.is_empty()),
            context: context.into(),
            target_url: target_url.filter(|u| !u.is_empty()),
            sink,
            noop_reported: AtomicBool::new(false),
        }
    }

    /// Detects the forge and commit, downgrading every failure to a warning.
    pub async fn connect<F>(
        target: ReportTarget<'_, F>,
        context: impl Into<String>,
        target_url: Option<String>,
        sink: &'a dyn DiagnosticSink,
    ) -> StatusReporter<'a>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !target.in_ci {
            sink.notice("CI environment variable not set, skipping status reporting");
            let reporter = Self::new(None, None, context, target_url, sink);
            reporter.noop_reported.store(true, Ordering::Relaxed);
            return reporter;
        }

        let client = match target
            .detector
            .detect_from_git(target.git, target.forge, sink)
            .await
        {
            Ok(client) => Some(client),
            Err(e) => {
                sink.warn(&e.to_string());
                None
            }
        };

        let commit = match &client {
            Some(_) => match target.commits.resolve(target.git).await {
                Ok(sha) => Some(sha),
                Err(e) => {
                    sink.warn(&format!("could not determine commit: {e}"));
                    None
                }
            },
            None => None,
        };

        Self::new(client, commit, context, target_url, sink)
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.client.is_some() && self.commit.is_some()
    }

    /// Sends one status. Returns `Ok(false)` without doing anything when
    /// there is no client or commit; that case is announced once.
    pub async fn report(&self, state: State, description: &str) -> Result<bool> {
        let (Some(client), Some(commit)) = (&self.client, &self.commit) else {
            if !self.noop_reported.swap(true, Ordering::Relaxed) {
                self.sink
                    .notice("forge client or commit not available, statuses will not be sent");
            }
            debug!("Skipping '{state}' status for {}", self.context);
            return Ok(false);
        };

        let opts = StatusOpts {
            commit: commit.clone(),
            context: self.context.clone(),
            state,
            description: description.to_string(),
            target_url: self.target_url.clone(),
        };
        client.set_status(&opts).await?;
        info!(
            "Set '{state}' status on {}@{commit} for {}",
            client.repo(),
            self.context
        );
        Ok(true)
    }

    /// Like [`report`](Self::report) but failures only produce a warning.
    async fn report_best_effort(&self, state: State, description: &str, what: &str) {
        if let Err(e) = self.report(state, description).await {
            self.sink.warn(&format!("failed to set {what} status: {e}"));
        }
    }
}

/// Orchestrator states. Everything after `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Success,
    Failure,
    TimedOut,
    StartFailed,
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
    pub descriptions: Descriptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub phase: Phase,
    pub exit_code: i32,
}

pub struct StatusOrchestrator<'a> {
    reporter: StatusReporter<'a>,
    supervisor: Supervisor,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> StatusOrchestrator<'a> {
    pub fn new(
        reporter: StatusReporter<'a>,
        supervisor: Supervisor,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            reporter,
            supervisor,
            sink,
        }
    }

    /// Runs the command and reports around it. The returned exit code is what
    /// the process should exit with.
    pub async fn run(&self, request: &RunRequest) -> RunSummary {
        let mut phase = Phase::Idle;
        debug!("{phase:?}: reporting running status");
        self.reporter
            .report_best_effort(State::Running, &request.descriptions.pending, "pending")
            .await;

        phase = Phase::Running;
        debug!("{phase:?}: executing {:?} {:?}", request.command, request.args);
        let outcome = self
            .supervisor
            .run(request.timeout, &request.command, &request.args)
            .await;

        let summary = match outcome.kind {
            OutcomeKind::Completed if outcome.exit_code == 0 => {
                self.reporter
                    .report_best_effort(State::Success, &request.descriptions.success, "final")
                    .await;
                RunSummary {
                    phase: Phase::Success,
                    exit_code: 0,
                }
            }
            OutcomeKind::Completed => {
                self.reporter
                    .report_best_effort(State::Failure, &request.descriptions.failure, "final")
                    .await;
                RunSummary {
                    phase: Phase::Failure,
                    exit_code: outcome.exit_code,
                }
            }
            OutcomeKind::TimedOut(limit) => {
                self.sink.error(&CiStatusError::Timeout(limit).to_string());
                self.reporter
                    .report_best_effort(State::Error, TIMEOUT_DESCRIPTION, "final")
                    .await;
                RunSummary {
                    phase: Phase::TimedOut,
                    exit_code: TIMEOUT_EXIT_CODE,
                }
            }
            OutcomeKind::FailedToStart(source) => {
                let error = CiStatusError::LaunchFailure {
                    command: request.command.clone(),
                    source,
                };
                self.sink.error(&error.to_string());
                RunSummary {
                    phase: Phase::StartFailed,
                    exit_code: LAUNCH_FAILURE_EXIT_CODE,
                }
            }
        };

        debug!("{:?}: exiting with {}", summary.phase, summary.exit_code);
        summary
    }
}
