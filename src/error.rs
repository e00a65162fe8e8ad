use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CiStatusError {
    #[error("invalid remote url {url:?}: {reason}")]
    InvalidRemote { url: String, reason: String },

    #[error("remote path {path:?} has fewer than two segments after cleaning")]
    InsufficientPathSegments { path: String },

    #[error("invalid repository segment {segment:?}: {reason}")]
    InvalidSegment { segment: String, reason: &'static str },

    #[error("could not determine remote url for 'origin' or 'upstream'")]
    NoRemoteFound,

    #[error("no supported forge detected for url: {0}")]
    UnsupportedForge(String),

    #[error("forge api error: {status} - {body}")]
    Api { status: String, body: String },

    #[error("failed to start command {command:?}: {source}")]
    LaunchFailure {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("`git {command}` failed: {message}")]
    Git { command: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CiStatusError>;
