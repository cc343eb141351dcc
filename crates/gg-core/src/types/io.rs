use gg_vcs::{LocalRepository, VcsError};
use serde::Serialize;
use std::fmt;

/// State transitions Gerrit exposes as `POST changes/{id}/{endpoint}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTransition {
    Abandon,
    WorkInProgress,
    Ready,
    Private,
    Public,
}

impl StateTransition {
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Abandon => "abandon",
            Self::WorkInProgress => "wip",
            Self::Ready => "ready",
            Self::Private => "private",
            Self::Public => "private.delete",
        }
    }
}

impl fmt::Display for StateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Abandon => "abandon",
            Self::WorkInProgress => "mark work-in-progress",
            Self::Ready => "mark ready for review",
            Self::Private => "mark private",
            Self::Public => "mark public",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyLevel {
    None,
    #[default]
    Owner,
    OwnerReviewers,
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HashtagEdit {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
}

impl HashtagEdit {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// An edit with no tags at all tags the changes with the checked-out branch name.
    pub fn or_branch_name<R: LocalRepository + ?Sized>(self, repo: &R) -> Result<Self, VcsError> {
        if !self.is_empty() {
            return Ok(self);
        }
        let branch = repo.active_branch_name()?;
        tracing::debug!(%branch, "no hashtags given, using active branch");
        Ok(Self {
            add: vec![branch],
            remove: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeRepository;

    #[test]
    fn test_transition_endpoints() {
        assert_eq!(StateTransition::WorkInProgress.endpoint(), "wip");
        assert_eq!(StateTransition::Public.endpoint(), "private.delete");
        assert_eq!(StateTransition::Abandon.to_string(), "abandon");
    }

    #[test]
    fn test_notify_wire_names() {
        assert_eq!(
            serde_json::to_string(&NotifyLevel::OwnerReviewers).unwrap(),
            "\"OWNER_REVIEWERS\""
        );
    }

    #[test]
    fn test_hashtag_edit_omits_empty_side() {
        let edit = HashtagEdit {
            add: vec!["release".to_string()],
            remove: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&edit).unwrap(),
            serde_json::json!({"add": ["release"]})
        );
    }

    #[test]
    fn test_explicit_tags_are_kept() {
        let edit = HashtagEdit {
            add: vec!["release".to_string()],
            remove: Vec::new(),
        };
        let repo = FakeRepository::detached();
        assert_eq!(edit.clone().or_branch_name(&repo).unwrap(), edit);
    }

    #[test]
    fn test_empty_edit_defaults_to_branch() {
        let repo = FakeRepository::on_branch("feature/login");
        let edit = HashtagEdit::default().or_branch_name(&repo).unwrap();
        assert_eq!(edit.add, vec!["feature/login".to_string()]);
        assert!(edit.remove.is_empty());
    }

    #[test]
    fn test_empty_edit_on_detached_head_fails() {
        let repo = FakeRepository::detached();
        assert!(matches!(
            HashtagEdit::default().or_branch_name(&repo),
            Err(VcsError::DetachedHead)
        ));
    }
}
