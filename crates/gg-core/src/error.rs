use crate::types::ChangeId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing option '{key}' in section gerrit in your git configuration")]
    MissingOption { key: &'static str },
    #[error("missing gerrit section in your git configuration and no fallback values in environment")]
    MissingSection,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("no Change-Id trailer found in commit {commit}")]
    MissingChangeId { commit: String },
    #[error("invalid change id '{value}': {reason}")]
    InvalidChangeId { value: String, reason: &'static str },
    #[error("invalid commit '{reference}'")]
    InvalidCommit { reference: String },
    #[error("refusing to set topic '{topic}' on {change}: it is the only change in its chain")]
    LonePreventBuild { change: ChangeId, topic: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("transport error: {reason}")]
    Transport { reason: String },
    #[error("unexpected response: {reason}")]
    Decode { reason: String },
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload file {path} does not exist")]
    NotFound { path: String },
    #[error("failed to read payload {path}: {reason}")]
    Unreadable { path: String, reason: String },
    #[error("payload {path} is not valid json: {reason}")]
    InvalidJson { path: String, reason: String },
    #[error("malformed payload: {message}")]
    Malformed { message: String },
}

#[derive(Debug, Error)]
pub enum GerritError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Vcs(#[from] gg_vcs::VcsError),
    #[error("change {change}: {source}")]
    Remote {
        change: ChangeId,
        #[source]
        source: RemoteError,
    },
    #[error("{context}: {source}")]
    Client {
        context: &'static str,
        #[source]
        source: RemoteError,
    },
}

impl GerritError {
    pub fn remote(change: &ChangeId) -> impl FnOnce(RemoteError) -> Self + '_ {
        move |source| Self::Remote {
            change: change.clone(),
            source,
        }
    }
}
