use log::warn;

use super::github::GitHubClient;
use super::{ForgeEnv, LoadOutcome, RemoteUrl, RepoRef};

/// Hosts owned by the dedicated GitHub strategy.
const GITHUB_HOSTS: [&str; 2] = ["github.com", "api.github.com"];

/// Path of the GitHub-compatible API on Gitea and Forgejo.
const COMPAT_API_PATH: &str = "/api/v1";

/// Strategy for self-hosted forges exposing a GitHub-compatible status API
/// (Gitea, Forgejo). The repository is taken from the last two path
/// segments, so nested groups work.
pub fn load_generic(remote: &RemoteUrl, env: &ForgeEnv) -> LoadOutcome {
    if GITHUB_HOSTS.iter().any(|host| remote.host_is(host)) {
        return LoadOutcome::NoMatch;
    }
    let Ok(repo) = RepoRef::from_path(&remote.path) else {
        return LoadOutcome::NoMatch;
    };
    let Some(token) = env.token.clone() else {
        return LoadOutcome::MissingCredentials;
    };

    let base_url = format!("{}{COMPAT_API_PATH}", remote.api_origin());
    let client = GitHubClient::new(repo, token, env.api_timeout)
        .and_then(|client| client.with_base_url(&base_url));

    match client {
        Ok(client) => LoadOutcome::Client(Box::new(client.named("generic"))),
        Err(e) => {
            warn!("Generic forge remote matched but the client could not be built: {e}");
            LoadOutcome::NoMatch
        }
    }
}
