use crate::backend::{map_backend_error, ConfigSource, LocalRepository, VcsError};
use gix::bstr::ByteSlice;
use std::path::{Path, PathBuf};

pub struct GitRepository {
    repo: gix::Repository,
    root: PathBuf,
}

impl GitRepository {
    /// Opens the repository enclosing `path`, searching parent directories.
    pub fn discover(path: &Path) -> Result<Self, VcsError> {
        let repo = gix::discover(path).map_err(|_| VcsError::RepoNotFound {
            path: path.display().to_string(),
        })?;
        let root = repo
            .workdir()
            .unwrap_or_else(|| repo.git_dir())
            .to_path_buf();
        Ok(Self { repo, root })
    }

    fn head_commit(&self) -> Result<gix::Commit<'_>, VcsError> {
        self.repo
            .head_commit()
            .map_err(map_backend_error("head commit"))
    }
}

impl LocalRepository for GitRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn head_commit_ref(&self) -> Result<String, VcsError> {
        Ok(self.head_commit()?.id.to_string())
    }

    fn current_commit_message(&self) -> Result<String, VcsError> {
        let commit = self.head_commit()?;
        Ok(commit.message_raw_sloppy().to_str_lossy().into_owned())
    }

    fn commit_message(&self, reference: &str) -> Result<String, VcsError> {
        let id = self
            .repo
            .rev_parse_single(reference)
            .map_err(|_| VcsError::RefNotFound {
                name: reference.to_string(),
            })?;
        let commit = id
            .object()
            .map_err(map_backend_error("load object"))?
            .peel_to_commit()
            .map_err(map_backend_error("peel commit"))?;
        Ok(commit.message_raw_sloppy().to_str_lossy().into_owned())
    }

    fn active_branch_name(&self) -> Result<String, VcsError> {
        let head = self
            .repo
            .head_name()
            .map_err(map_backend_error("head name"))?
            .ok_or(VcsError::DetachedHead)?;
        Ok(head.shorten().to_str_lossy().into_owned())
    }
}

impl ConfigSource for GitRepository {
    fn has_section(&self, section: &str) -> bool {
        let config = self.repo.config_snapshot();
        config
            .plumbing()
            .sections_by_name(section)
            .is_some_and(|mut sections| sections.next().is_some())
    }

    fn value(&self, section: &str, key: &str) -> Option<String> {
        let config = self.repo.config_snapshot();
        let name = format!("{section}.{key}");
        config
            .string(name.as_str())
            .map(|value| value.to_str_lossy().into_owned())
    }
}
