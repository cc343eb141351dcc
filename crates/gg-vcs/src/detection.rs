use crate::backend::{map_backend_error, VcsError};
use crate::git::GitRepository;
use std::ffi::OsStr;
use std::path::PathBuf;

pub const WORKSPACE_ENV: &str = "WORKSPACE";

/// Directory the repository search starts from: `$WORKSPACE` when set, else the cwd.
pub fn search_entry(workspace: Option<&OsStr>) -> Result<PathBuf, VcsError> {
    match workspace {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => std::env::current_dir().map_err(map_backend_error("current dir")),
    }
}

pub fn discover_repo() -> Result<GitRepository, VcsError> {
    let workspace = std::env::var_os(WORKSPACE_ENV);
    let entry = search_entry(workspace.as_deref())?;
    tracing::debug!(entry = %entry.display(), "discovering git repository");
    GitRepository::discover(&entry)
}
