use log::debug;

use crate::error::Result;
use crate::git::Git;

/// CI variables carrying the commit SHA, checked in this order.
pub const COMMIT_ENV_VARS: [&str; 3] = ["GITHUB_SHA", "CI_COMMIT_SHA", "BITBUCKET_COMMIT"];

/// Resolves the commit to report against.
///
/// Precedence: explicit override, then the first non-empty CI variable, then
/// the local `HEAD`.
pub struct CommitResolver<F> {
    override_sha: Option<String>,
    lookup: F,
}

impl CommitResolver<fn(&str) -> Option<String>> {
    /// Resolver backed by the process environment.
    pub fn from_env(override_sha: Option<String>) -> Self {
        Self::new(override_sha, |name| std::env::var(name).ok())
    }
}

impl<F> CommitResolver<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(override_sha: Option<String>, lookup: F) -> Self {
        Self {
            override_sha,
            lookup,
        }
    }

    /// Commit from the override or the environment, without asking git.
    pub fn from_context(&self) -> Option<String> {
        if let Some(sha) = self.override_sha.as_deref().map(str::trim) {
            if !sha.is_empty() {
                debug!("Using commit from override: {sha}");
                return Some(sha.to_string());
            }
        }

        COMMIT_ENV_VARS.iter().find_map(|name| {
            let sha = (self.lookup)(name)?;
            let sha = sha.trim();
            (!sha.is_empty()).then(|| {
                debug!("Using commit from {name}: {sha}");
                sha.to_string()
            })
        })
    }

    /// # Errors
    ///
    /// Fails only when the `HEAD` fallback is needed and git cannot answer.
    pub async fn resolve(&self, git: &Git) -> Result<String> {
        if let Some(sha) = self.from_context() {
            return Ok(sha);
        }
        let sha = git.head_commit().await?;
        debug!("Using commit from HEAD: {sha}");
        Ok(sha)
    }
}
