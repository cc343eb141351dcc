use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("git repository not found from {path}")]
    RepoNotFound { path: String },
    #[error("ref not found: {name}")]
    RefNotFound { name: String },
    #[error("HEAD is detached, no active branch")]
    DetachedHead,
    #[error("backend error: {reason}")]
    BackendError { reason: String },
}

/// Read-only view of the checkout the tool was started from.
pub trait LocalRepository {
    fn root(&self) -> &Path;
    /// Full hex id of the commit HEAD points at.
    fn head_commit_ref(&self) -> Result<String, VcsError>;
    fn current_commit_message(&self) -> Result<String, VcsError>;
    /// Message of the commit `reference` resolves to (hash, branch, `HEAD~2`, ...).
    fn commit_message(&self, reference: &str) -> Result<String, VcsError>;
    fn active_branch_name(&self) -> Result<String, VcsError>;
}

/// Layered git configuration lookup.
pub trait ConfigSource {
    fn has_section(&self, section: &str) -> bool;
    fn value(&self, section: &str, key: &str) -> Option<String>;
}

pub(crate) fn map_backend_error<E: std::fmt::Display>(
    context: &'static str,
) -> impl FnOnce(E) -> VcsError {
    move |err| VcsError::BackendError {
        reason: format!("{context}: {err}"),
    }
}
