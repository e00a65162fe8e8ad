use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::auth::Token;
use crate::error::{CiStatusError, Result};

use super::{ForgeClient, ForgeEnv, LoadOutcome, RemoteUrl, RepoRef, State, StatusOpts};

/// Root of the public GitHub REST API.
pub const PUBLIC_API_URL: &str = "https://api.github.com";

const GITHUB_HOST: &str = "github.com";
const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);
const ACCEPT_V3: &str = "application/vnd.github.v3+json";

/// How [`State`] values are mapped before transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTranslation {
    /// The legacy commit status API has no `running`; send `pending`.
    RunningAsPending,
    /// Send every state unchanged.
    PassThrough,
}

impl StateTranslation {
    /// Only the public API root downgrades `running`.
    pub fn for_base_url(base_url: &Url) -> Self {
        if base_url.as_str().trim_end_matches('/') == PUBLIC_API_URL {
            StateTranslation::RunningAsPending
        } else {
            StateTranslation::PassThrough
        }
    }

    pub fn apply(self, state: State) -> State {
        match (self, state) {
            (StateTranslation::RunningAsPending, State::Running) => State::Pending,
            (_, state) => state,
        }
    }
}

/// Client for the GitHub commit status API and compatible implementations.
pub struct GitHubClient {
    client: Client,
    base_url: Url,
    repo: RepoRef,
    token: Token,
    translation: StateTranslation,
    name: &'static str,
}

#[derive(Serialize)]
struct StatusRequest<'a> {
    state: State,
    description: &'a str,
    context: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_url: Option<&'a str>,
}

impl GitHubClient {
    /// Creates a client targeting the public API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(repo: RepoRef, token: Token, timeout: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V3));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("ci-status/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(
                timeout
                    .filter(|t| !t.is_zero())
                    .unwrap_or(DEFAULT_API_TIMEOUT),
            )
            .build()
            .map_err(|e| CiStatusError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(PUBLIC_API_URL)
            .map_err(|e| CiStatusError::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self {
            client,
            translation: StateTranslation::for_base_url(&base_url),
            base_url,
            repo,
            token,
            name: "github",
        })
    }

    /// Points the client at another API root, e.g. `https://gitea.example.com/api/v1`.
    ///
    /// The state translation follows the new root.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CiStatusError::Config(format!("Invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CiStatusError::Config(format!(
                "Invalid base URL: {base_url}"
            )));
        }
        self.translation = StateTranslation::for_base_url(&base_url);
        self.base_url = base_url;
        Ok(self)
    }

    #[cfg(test)]
    pub fn with_translation(mut self, translation: StateTranslation) -> Self {
        self.translation = translation;
        self
    }

    pub(super) fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[cfg(test)]
    pub fn translation(&self) -> StateTranslation {
        self.translation
    }

    /// `{base}/repos/{owner}/{repo}/statuses/{commit}`, each part encoded as
    /// a single path segment.
    pub fn statuses_url(&self, commit: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "repos",
                self.repo.owner(),
                self.repo.repo(),
                "statuses",
                commit,
            ]);
        }
        url
    }
}

#[async_trait]
impl ForgeClient for GitHubClient {
    fn name(&self) -> &'static str {
        self.name
    }

    fn repo(&self) -> &RepoRef {
        &self.repo
    }

    async fn set_status(&self, opts: &StatusOpts) -> Result<()> {
        if opts.context.is_empty() {
            return Err(CiStatusError::Config("status context must not be empty".to_string()));
        }
        // Dot segments would be dropped from the URL path.
        if matches!(opts.commit.as_str(), "" | "." | "..") {
            return Err(CiStatusError::Config(format!(
                "invalid commit {:?}",
                opts.commit
            )));
        }

        let url = self.statuses_url(&opts.commit);
        let state = self.translation.apply(opts.state);
        let body = StatusRequest {
            state,
            description: &opts.description,
            context: &opts.context,
            target_url: opts.target_url.as_deref().filter(|u| !u.is_empty()),
        };

        debug!("POST {url} (state: {state}, context: {})", opts.context);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(CiStatusError::Api {
                status: status.to_string(),
                body,
            });
        }

        Ok(())
    }
}

/// Strategy for `github.com` remotes with exactly `owner/repo` as path.
pub fn load_github(remote: &RemoteUrl, env: &ForgeEnv) -> LoadOutcome {
    if !remote.host_is(GITHUB_HOST) {
        return LoadOutcome::NoMatch;
    }
    let segments = super::validation::clean_segments(&remote.path);
    let [owner, repo] = segments.as_slice() else {
        return LoadOutcome::NoMatch;
    };
    let Ok(repo) = RepoRef::new(owner, repo) else {
        return LoadOutcome::NoMatch;
    };
    let Some(token) = env.token.clone() else {
        return LoadOutcome::MissingCredentials;
    };

    match GitHubClient::new(repo, token, env.api_timeout) {
        Ok(client) => LoadOutcome::Client(Box::new(client)),
        Err(e) => {
            warn!("GitHub remote matched but the client could not be built: {e}");
            LoadOutcome::NoMatch
        }
    }
}
