use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CiStatusError, Result};

/// Allowed characters for a repository owner or name: alphanumerics,
/// underscores, hyphens and periods. Slashes, backslashes, query and control
/// characters never match.
static VALID_REPO_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("static regex"));

/// Validated `(owner, repo)` pair.
///
/// Both segments end up verbatim in API URL paths, so construction is the
/// only place they are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    owner: String,
    repo: String,
}

impl RepoRef {
    pub fn new(owner: &str, repo: &str) -> Result<Self> {
        validate_segment(owner)?;
        validate_segment(repo)?;
        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Extracts owner and repository from the last two segments of a remote
    /// path, after resolving `.` and `..` the way path cleaning would.
    ///
    /// Nested groups (`/group/subgroup/project`) yield
    /// `(subgroup, project)`.
    pub fn from_path(path: &str) -> Result<Self> {
        let segments = clean_segments(path);
        match segments.as_slice() {
            [.., owner, repo] => Self::new(owner, repo),
            _ => Err(CiStatusError::InsufficientPathSegments {
                path: path.to_string(),
            }),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Splits a path on `/`, drops empty segments and resolves dot segments.
/// `..` at the root is dropped, as for a rooted path.
pub fn clean_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments
}

fn validate_segment(segment: &str) -> Result<()> {
    let invalid = |reason| CiStatusError::InvalidSegment {
        segment: segment.to_string(),
        reason,
    };
    if segment.is_empty() {
        return Err(invalid("repository segment cannot be empty"));
    }
    if segment == "." || segment == ".." {
        return Err(invalid("repository segment cannot be '.' or '..'"));
    }
    if !VALID_REPO_SEGMENT.is_match(segment) {
        return Err(invalid("repository segment contains invalid characters"));
    }
    Ok(())
}
