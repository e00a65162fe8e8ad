use std::path::PathBuf;
use std::process::Stdio;

use log::debug;
use tokio::process::Command;

use crate::error::{CiStatusError, Result};

/// Remotes consulted for the repository URL, in order.
const REMOTE_NAMES: [&str; 2] = ["origin", "upstream"];

/// Read-only queries against the local git repository.
#[derive(Debug, Clone, Default)]
pub struct Git {
    dir: Option<PathBuf>,
}

impl Git {
    /// Queries the repository containing the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// URL of `origin`, falling back to `upstream`.
    ///
    /// # Errors
    ///
    /// [`CiStatusError::NoRemoteFound`] when neither remote is configured.
    pub async fn remote_url(&self) -> Result<String> {
        for name in REMOTE_NAMES {
            match self.run(&["remote", "get-url", name]).await {
                Ok(url) if !url.is_empty() => return Ok(url),
                Ok(_) => debug!("Remote '{name}' has an empty url"),
                Err(e) => debug!("Remote '{name}' unavailable: {e}"),
            }
        }
        Err(CiStatusError::NoRemoteFound)
    }

    /// SHA of the checked-out commit.
    pub async fn head_commit(&self) -> Result<String> {
        self.run(&["rev-parse", "HEAD"]).await
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|e| CiStatusError::Git {
            command: args.join(" "),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(CiStatusError::Git {
                command: args.join(" "),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
