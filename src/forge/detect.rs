use log::{debug, info};

use crate::auth::TOKEN_ENV;
use crate::diagnostics::DiagnosticSink;
use crate::error::{CiStatusError, Result};
use crate::git::Git;

use super::{load_generic, load_github, ForgeClient, ForgeEnv, ForgeKind, ForgeLoader, LoadOutcome, RemoteUrl};

/// Strategies in precedence order. The dedicated GitHub strategy comes
/// before the generic one, which declines GitHub hosts anyway.
const STRATEGIES: [(ForgeKind, ForgeLoader); 2] = [
    (ForgeKind::Github, load_github),
    (ForgeKind::Generic, load_generic),
];

/// Picks a [`ForgeClient`] for a remote by trying each strategy in turn.
pub struct ForgeDetector {
    env: ForgeEnv,
    strategies: Vec<(ForgeKind, ForgeLoader)>,
}

impl ForgeDetector {
    pub fn new(env: ForgeEnv) -> Self {
        Self {
            env,
            strategies: STRATEGIES.to_vec(),
        }
    }

    /// Resolves the `origin` (or `upstream`) remote and detects its forge.
    ///
    /// # Errors
    ///
    /// [`CiStatusError::NoRemoteFound`] when neither remote is configured,
    /// otherwise whatever [`ForgeDetector::detect`] returns.
    pub async fn detect_from_git(
        &self,
        git: &Git,
        preferred: Option<ForgeKind>,
        sink: &dyn DiagnosticSink,
    ) -> Result<Box<dyn ForgeClient>> {
        let remote = git.remote_url().await?;
        self.detect(&remote, preferred, sink)
    }

    /// Detects the forge for a raw remote URL.
    ///
    /// The `preferred` strategy, if any, is tried first; the rest follow in
    /// the usual order. A strategy that recognizes the remote but has no
    /// credential is skipped with a warning.
    ///
    /// # Errors
    ///
    /// [`CiStatusError::InvalidRemote`] if the URL cannot be parsed and
    /// [`CiStatusError::UnsupportedForge`] if no strategy produced a client.
    pub fn detect(
        &self,
        raw_remote: &str,
        preferred: Option<ForgeKind>,
        sink: &dyn DiagnosticSink,
    ) -> Result<Box<dyn ForgeClient>> {
        let remote = RemoteUrl::parse(raw_remote)?;
        debug!("Detecting forge for remote {remote}");

        for (kind, loader) in self.ordered(preferred) {
            match loader(&remote, &self.env) {
                LoadOutcome::Client(client) => {
                    info!(
                        "Using {} forge for {} ({kind} strategy)",
                        client.name(),
                        client.repo()
                    );
                    return Ok(client);
                }
                LoadOutcome::MissingCredentials => {
                    sink.warn(&format!(
                        "remote {remote} matches the {kind} forge but {TOKEN_ENV} is not set"
                    ));
                }
                LoadOutcome::NoMatch => debug!("{kind} strategy does not apply to {remote}"),
            }
        }

        Err(CiStatusError::UnsupportedForge(remote.to_string()))
    }

    fn ordered(&self, preferred: Option<ForgeKind>) -> Vec<(ForgeKind, ForgeLoader)> {
        let mut ordered: Vec<_> = self
            .strategies
            .iter()
            .filter(|(kind, _)| Some(*kind) == preferred)
            .copied()
            .collect();
        ordered.extend(
            self.strategies
                .iter()
                .filter(|(kind, _)| Some(*kind) != preferred)
                .copied(),
        );
        ordered
    }
}
