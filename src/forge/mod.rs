//! Forge detection and commit-status reporting.
//!
//! A remote URL is turned into a [`RemoteUrl`], then offered to an ordered
//! chain of strategies ([`detect`]). The first one that recognizes it builds a
//! [`ForgeClient`] bound to a validated [`RepoRef`].

mod detect;
mod generic;
mod github;
mod remote;
mod validation;


use std::fmt;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::auth::{Token, TOKEN_ENV};
use crate::error::Result;

pub use detect::ForgeDetector;
pub use generic::load_generic;
pub use github::{load_github, GitHubClient, StateTranslation};
pub use remote::RemoteUrl;
pub use validation::RepoRef;

/// Commit status state.
///
/// `Running` is a logical pre-state. APIs without such a concept receive
/// `pending` instead, see [`StateTranslation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Running,
    Pending,
    Success,
    Failure,
    Error,
}

impl State {
    pub fn as_str(self) -> &'static str {
        match self {
            State::Running => "running",
            State::Pending => "pending",
            State::Success => "success",
            State::Failure => "failure",
            State::Error => "error",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a single commit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusOpts {
    /// Full SHA (or override string) of the commit.
    pub commit: String,
    /// Label shown in the forge UI, e.g. `ci/lint`.
    pub context: String,
    pub state: State,
    pub description: String,
    /// Link to details, omitted from the request when `None`.
    pub target_url: Option<String>,
}

/// Capability to set commit statuses on one repository.
#[async_trait]
pub trait ForgeClient: Send + Sync {
    /// Short forge name for logs.
    fn name(&self) -> &'static str;

    fn repo(&self) -> &RepoRef;

    async fn set_status(&self, opts: &StatusOpts) -> Result<()>;
}

/// Forge names accepted by `--forge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ForgeKind {
    /// github.com through the public API.
    Github,
    /// Self-hosted Gitea/Forgejo compatible API under `/api/v1`.
    Generic,
}

impl fmt::Display for ForgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForgeKind::Github => f.write_str("github"),
            ForgeKind::Generic => f.write_str("generic"),
        }
    }
}

/// Credentials and settings handed to strategies, so they never read the
/// process environment themselves.
#[derive(Debug, Clone, Default)]
pub struct ForgeEnv {
    pub token: Option<Token>,
    /// Per-request timeout for status calls.
    pub api_timeout: Option<std::time::Duration>,
}

impl ForgeEnv {
    pub fn from_env() -> Self {
        Self {
            token: std::env::var(TOKEN_ENV).ok().and_then(|t| Token::new(&t)),
            api_timeout: None,
        }
    }

    pub fn with_api_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.api_timeout = Some(timeout);
        self
    }
}

/// Result of offering a remote to one strategy.
pub enum LoadOutcome {
    Client(Box<dyn ForgeClient>),
    /// The remote does not have this forge's shape.
    NoMatch,
    /// The remote matches but the credential is missing.
    MissingCredentials,
}

impl fmt::Debug for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadOutcome::Client(client) => write!(f, "Client({} {})", client.name(), client.repo()),
            LoadOutcome::NoMatch => f.write_str("NoMatch"),
            LoadOutcome::MissingCredentials => f.write_str("MissingCredentials"),
        }
    }
}

/// A strategy: inspect the remote and maybe build a client.
pub type ForgeLoader = fn(&RemoteUrl, &ForgeEnv) -> LoadOutcome;
