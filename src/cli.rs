use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use crate::commit::CommitResolver;
use crate::config::Config;
use crate::diagnostics::{DiagnosticSink, StderrSink};
use crate::duration::{non_zero, parse_duration};
use crate::executor::Supervisor;
use crate::forge::{ForgeDetector, ForgeEnv, ForgeKind, State};
use crate::git::Git;
use crate::orchestrator::{ReportTarget, RunRequest, StatusOrchestrator, StatusReporter};

/// Exit code for usage errors detected after argument parsing.
const USAGE_EXIT_CODE: i32 = 1;

#[derive(Parser)]
#[command(name = "ci-status")]
#[command(author, version, about = "Report CI command results to the forge as commit statuses", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./ci-status.{toml,json,yaml,yml})
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

/// Flags shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
struct ForgeArgs {
    /// Override automatic forge detection
    #[arg(long, value_enum)]
    forge: Option<ForgeKind>,

    /// Override commit SHA
    #[arg(long)]
    commit: Option<String>,

    /// Target URL for details
    #[arg(long)]
    url: Option<String>,

    /// Suppress warnings and noop notices
    #[arg(long, default_value_t = false)]
    silent: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command and report its status
    Run {
        /// Status context, e.g. "ci/test"
        context: String,

        #[command(flatten)]
        forge: ForgeArgs,

        /// Description shown while the command is running
        #[arg(long)]
        pending_desc: Option<String>,

        /// Description shown when the command exits with code 0
        #[arg(long)]
        success_desc: Option<String>,

        /// Description shown when the command exits non-zero
        #[arg(long)]
        failure_desc: Option<String>,

        /// Maximum time allowed for the command, e.g. "30s" or "1h30m"
        #[arg(long, value_parser = parse_duration)]
        timeout: Option<std::time::Duration>,

        /// Command and arguments, after `--`
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// Set a status for a context
    Set {
        /// Status context, e.g. "ci/deploy"
        context: String,

        #[command(flatten)]
        forge: ForgeArgs,

        /// State to set
        #[arg(long, value_enum, default_value_t = State::Pending)]
        state: State,

        /// Description of the status
        #[arg(long, default_value = "")]
        description: String,
    },
}

impl Cli {
    /// Runs the selected subcommand and returns the process exit code.
    pub async fn execute(self) -> Result<i32> {
        let config = Config::load(self.config.as_deref())?;

        match self.command {
            Commands::Run {
                context,
                forge,
                pending_desc,
                success_desc,
                failure_desc,
                timeout,
                command,
            } => {
                let mut descriptions = config.descriptions();
                if let Some(pending) = pending_desc {
                    descriptions.pending = pending;
                }
                if let Some(success) = success_desc {
                    descriptions.success = success;
                }
                if let Some(failure) = failure_desc {
                    descriptions.failure = failure;
                }
                let timeout = match timeout {
                    Some(timeout) => non_zero(timeout),
                    None => config.run_timeout()?.and_then(non_zero),
                };

                let sink = StderrSink::new(forge.silent || config.output.silent);
                let Some((program, args)) = command.split_first() else {
                    sink.error("command missing after --");
                    return Ok(USAGE_EXIT_CODE);
                };

                let request = RunRequest {
                    command: program.clone(),
                    args: args.to_vec(),
                    timeout,
                    descriptions,
                };

                info!("Running {program:?} for context {context}");
                let reporter = connect(&config, &forge, context, &sink).await?;
                let summary = StatusOrchestrator::new(reporter, Supervisor::new(), &sink)
                    .run(&request)
                    .await;
                Ok(summary.exit_code)
            }
            Commands::Set {
                context,
                forge,
                state,
                description,
            } => {
                let sink = StderrSink::new(forge.silent || config.output.silent);
                let reporter = connect(&config, &forge, context, &sink).await?;
                match reporter.report(state, &description).await {
                    Ok(_) => Ok(0),
                    Err(e) => {
                        sink.error(&format!("failed to set status: {e}"));
                        Ok(1)
                    }
                }
            }
        }
    }
}

async fn connect<'a>(
    config: &Config,
    args: &ForgeArgs,
    context: String,
    sink: &'a dyn DiagnosticSink,
) -> Result<StatusReporter<'a>> {
    let env = ForgeEnv::from_env().with_api_timeout(config.api_timeout()?);
    let detector = ForgeDetector::new(env);
    let commits = CommitResolver::from_env(args.commit.clone());
    let git = Git::new();
    let in_ci = std::env::var("CI").is_ok_and(|v| !v.is_empty());

    let target = ReportTarget {
        in_ci,
        forge: args.forge.or(config.forge.name),
        detector: &detector,
        commits: &commits,
        git: &git,
    };
    Ok(StatusReporter::connect(target, context, args.url.clone(), sink).await)
}
