use std::fmt;

use url::Url;

use crate::error::{CiStatusError, Result};

/// Schemes a remote may use once SCP-style syntax has been rewritten.
const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "ssh"];

/// Canonical form of a git remote.
///
/// The path is left as parsed. Turning it into owner and repository is the
/// job of [`RepoRef::from_path`](super::RepoRef::from_path), which works on
/// segments rather than on the raw string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
}

impl RemoteUrl {
    /// Parses any supported remote syntax:
    ///
    /// - `https://host/owner/repo[.git]`
    /// - `ssh://git@host/owner/repo[.git]`
    /// - `git@host:owner/repo[.git]` (SCP-style)
    ///
    /// # Errors
    ///
    /// Returns [`CiStatusError::InvalidRemote`] for empty input, control
    /// characters, unparseable URLs, unsupported schemes, an empty host, or a
    /// query string or fragment.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| CiStatusError::InvalidRemote {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("remote url cannot be empty"));
        }
        // The URL parser silently drops tabs and newlines, so reject them here.
        if trimmed.chars().any(char::is_control) {
            return Err(invalid("contains control characters"));
        }
        // http(s) parsing would turn `\` into `/` and resolve `..` segments.
        if trimmed.contains('\\') {
            return Err(invalid("contains backslashes"));
        }

        let stripped = trimmed.trim_end_matches('/');
        let stripped = stripped.strip_suffix(".git").unwrap_or(stripped);
        let stripped = stripped.trim_end_matches('/');

        let rewritten = rewrite_scp_style(stripped);

        let url = Url::parse(&rewritten).map_err(|e| invalid(&e.to_string()))?;

        if !ALLOWED_SCHEMES.contains(&url.scheme()) {
            return Err(invalid("unsupported scheme"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query strings and fragments are not allowed"));
        }
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(invalid("missing host")),
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port: url.port(),
            path: url.path().to_string(),
        })
    }

    /// Case-insensitive host comparison.
    pub fn host_is(&self, host: &str) -> bool {
        self.host.eq_ignore_ascii_case(host)
    }

    /// Origin of the web/API endpoint serving this remote.
    ///
    /// SSH remotes are assumed to be served over HTTPS on the default port,
    /// since the SSH port says nothing about the API.
    pub fn api_origin(&self) -> String {
        match (self.scheme.as_str(), self.port) {
            ("ssh", _) | (_, None) => format!("{}://{}", self.api_scheme(), self.host),
            (scheme, Some(port)) => format!("{scheme}://{}:{port}", self.host),
        }
    }

    fn api_scheme(&self) -> &str {
        if self.scheme == "ssh" {
            "https"
        } else {
            &self.scheme
        }
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}://{}:{}{}", self.scheme, self.host, port, self.path),
            None => write!(f, "{}://{}{}", self.scheme, self.host, self.path),
        }
    }
}

/// Rewrites `user@host:path` to `ssh://user@host/path`.
///
/// Only applies when the string has `@` and `:` but no `://`. Only the first
/// `:` after the `@` is replaced.
fn rewrite_scp_style(raw: &str) -> String {
    if raw.contains("://") {
        return raw.to_string();
    }
    let Some(at) = raw.find('@') else {
        return raw.to_string();
    };
    match raw[at..].find(':') {
        Some(offset) => {
            let colon = at + offset;
            format!("ssh://{}/{}", &raw[..colon], &raw[colon + 1..])
        }
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> RemoteUrl {
        RemoteUrl::parse(raw).unwrap_or_else(|e| panic!("{raw}: {e}"))
    }

    #[test]
    fn test_parse_https() {
        let url = parsed("https://github.com/owner/repo.git");
        assert_eq!(url.scheme, "https");
        assert_eq!(url.host, "github.com");
        assert_eq!(url.path, "/owner/repo");
    }

    #[test]
    fn test_parse_https_without_suffix_and_trailing_slash() {
        assert_eq!(parsed("https://github.com/owner/repo").path, "/owner/repo");
        assert_eq!(parsed("https://github.com/owner/repo/").path, "/owner/repo");
        assert_eq!(parsed("https://github.com/owner/repo.git/").path, "/owner/repo");
    }

    #[test]
    fn test_parse_ssh() {
        let url = parsed("ssh://git@github.com/owner/repo.git");
        assert_eq!(url.scheme, "ssh");
        assert_eq!(url.host, "github.com");
        assert_eq!(url.path, "/owner/repo");
    }

    #[test]
    fn test_parse_scp_style() {
        let url = parsed("git@github.com:owner/repo.git");
        assert_eq!(url.scheme, "ssh");
        assert_eq!(url.host, "github.com");
        assert_eq!(url.path, "/owner/repo");

        assert_eq!(parsed("git@github.com:owner/repo").path, "/owner/repo");
    }

    #[test]
    fn test_scp_rewrite_only_touches_first_colon_after_at() {
        assert_eq!(
            rewrite_scp_style("git@host:group/a:b"),
            "ssh://git@host/group/a:b"
        );
        assert_eq!(
            rewrite_scp_style("https://host/owner/repo"),
            "https://host/owner/repo"
        );
    }

    #[test]
    fn test_parse_nested_group_path() {
        let url = parsed("https://git.example.com/group/subgroup/project");
        assert_eq!(url.host, "git.example.com");
        assert_eq!(url.path, "/group/subgroup/project");
    }

    #[test]
    fn test_parse_keeps_port() {
        let url = parsed("http://gitea.local:3000/owner/repo.git");
        assert_eq!(url.port, Some(3000));
        assert_eq!(url.api_origin(), "http://gitea.local:3000");
    }

    #[test]
    fn test_api_origin_for_ssh_ignores_ssh_port() {
        let url = parsed("ssh://git@gitea.local:2222/owner/repo.git");
        assert_eq!(url.api_origin(), "https://gitea.local");
        assert_eq!(parsed("git@gitea.local:owner/repo").api_origin(), "https://gitea.local");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in [
            "",
            "   ",
            "invalid",
            "file:///srv/git/repo.git",
            "ssh:///owner/repo",
            "https://example.com/owner/repo?x=1",
            "https://example.com/owner/repo#frag",
            "https://example.com/own\ner/repo",
            "https://example.com/owner/re\tpo",
            "https://github.com/owner\\repo",
            "https://gitea.example.com/a\\..\\..\\owner\\repo",
            "git@gitea.example.com:owner\\repo.git",
        ] {
            assert!(
                matches!(
                    RemoteUrl::parse(raw),
                    Err(CiStatusError::InvalidRemote { .. })
                ),
                "expected InvalidRemote for {raw:?}"
            );
        }
    }

    #[test]
    fn test_host_is_case_insensitive() {
        assert!(parsed("git@GitHub.com:owner/repo").host_is("github.com"));
    }
}
