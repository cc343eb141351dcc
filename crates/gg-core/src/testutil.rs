//! In-memory stand-ins for the repository, git config and Gerrit server.

use crate::error::RemoteError;
use crate::review_payload::ReviewPayload;
use crate::server::ReviewServer;
use crate::types::{ChangeDetail, ChangeId, HashtagEdit, RobotCommentInfo, StateTransition};
use gg_vcs::{ConfigSource, LocalRepository, VcsError};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

pub fn id(value: &str) -> ChangeId {
    ChangeId::new(value).unwrap()
}

pub fn detail(change: &str, number: u64) -> ChangeDetail {
    ChangeDetail {
        id: id(change),
        number,
        project: "platform/build".to_string(),
        branch: "main".to_string(),
        subject: format!("Change {number}"),
        status: "NEW".to_string(),
        topic: None,
        hashtags: Vec::new(),
        current_revision: Some(1),
        labels: BTreeMap::new(),
    }
}

pub struct FakeConfig {
    section: Option<HashMap<String, String>>,
}

impl FakeConfig {
    pub fn empty() -> Self {
        Self { section: None }
    }

    pub fn section(values: &[(&str, &str)]) -> Self {
        Self {
            section: Some(
                values
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            ),
        }
    }
}

impl ConfigSource for FakeConfig {
    fn has_section(&self, section: &str) -> bool {
        section == "gerrit" && self.section.is_some()
    }

    fn value(&self, section: &str, key: &str) -> Option<String> {
        if section != "gerrit" {
            return None;
        }
        self.section.as_ref()?.get(key).cloned()
    }
}

pub struct FakeRepository {
    branch: Option<String>,
    commits: HashMap<String, String>,
}

impl FakeRepository {
    pub fn on_branch(branch: &str) -> Self {
        Self {
            branch: Some(branch.to_string()),
            commits: HashMap::new(),
        }
    }

    pub fn detached() -> Self {
        Self {
            branch: None,
            commits: HashMap::new(),
        }
    }

    pub fn with_commit(mut self, reference: &str, message: &str) -> Self {
        self.commits
            .insert(reference.to_string(), message.to_string());
        self
    }
}

impl LocalRepository for FakeRepository {
    fn root(&self) -> &Path {
        Path::new("/fake")
    }

    fn head_commit_ref(&self) -> Result<String, VcsError> {
        Ok("0123456789abcdef0123456789abcdef01234567".to_string())
    }

    fn current_commit_message(&self) -> Result<String, VcsError> {
        self.commit_message("HEAD")
    }

    fn commit_message(&self, reference: &str) -> Result<String, VcsError> {
        self.commits
            .get(reference)
            .cloned()
            .ok_or_else(|| VcsError::RefNotFound {
                name: reference.to_string(),
            })
    }

    fn active_branch_name(&self) -> Result<String, VcsError> {
        self.branch.clone().ok_or(VcsError::DetachedHead)
    }
}

/// In-memory Gerrit that records every call as a short line, e.g. `set_topic c1 NOCI`.
#[derive(Default)]
pub struct FakeServer {
    calls: RefCell<Vec<String>>,
    failures: HashMap<String, RemoteError>,
    related: HashMap<String, Vec<ChangeId>>,
    details: HashMap<String, ChangeDetail>,
    topics: RefCell<HashMap<String, String>>,
    hashtags: RefCell<HashMap<String, Vec<String>>>,
    robot_comments: HashMap<String, Vec<RobotCommentInfo>>,
    posted_payloads: RefCell<Vec<ReviewPayload>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_related(mut self, change: &str, related: &[&str]) -> Self {
        self.related
            .insert(change.to_string(), related.iter().map(|c| id(c)).collect());
        self
    }

    pub fn with_detail(mut self, detail: ChangeDetail) -> Self {
        self.details.insert(detail.id.to_string(), detail);
        self
    }

    pub fn with_topic(self, change: &str, topic: &str) -> Self {
        self.topics
            .borrow_mut()
            .insert(change.to_string(), topic.to_string());
        self
    }

    pub fn with_hashtags(self, change: &str, tags: &[&str]) -> Self {
        self.hashtags.borrow_mut().insert(
            change.to_string(),
            tags.iter().map(|t| (*t).to_string()).collect(),
        );
        self
    }

    pub fn with_robot_comments(mut self, change: &str, comments: Vec<RobotCommentInfo>) -> Self {
        self.robot_comments.insert(change.to_string(), comments);
        self
    }

    /// Makes the call recorded as `call` fail with `error`.
    pub fn failing(mut self, call: &str, error: RemoteError) -> Self {
        self.failures.insert(call.to_string(), error);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn topic_of(&self, change: &str) -> Option<String> {
        self.topics.borrow().get(change).cloned()
    }

    pub fn posted_payloads(&self) -> Vec<ReviewPayload> {
        self.posted_payloads.borrow().clone()
    }

    fn record(&self, call: String) -> Result<(), RemoteError> {
        self.calls.borrow_mut().push(call.clone());
        match self.failures.get(&call) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl ReviewServer for FakeServer {
    async fn change_detail(&self, change: &ChangeId) -> Result<ChangeDetail, RemoteError> {
        self.record(format!("detail {change}"))?;
        self.details
            .get(change.as_str())
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                message: format!("Not found: {change}"),
            })
    }

    async fn related_changes(&self, change: &ChangeId) -> Result<Vec<ChangeId>, RemoteError> {
        self.record(format!("related {change}"))?;
        Ok(self.related.get(change.as_str()).cloned().unwrap_or_default())
    }

    async fn post_review_message(
        &self,
        change: &ChangeId,
        message: &str,
    ) -> Result<(), RemoteError> {
        self.record(format!("review {change} {message}"))
    }

    async fn topic(&self, change: &ChangeId) -> Result<Option<String>, RemoteError> {
        self.record(format!("topic {change}"))?;
        Ok(self.topic_of(change.as_str()))
    }

    async fn set_topic(&self, change: &ChangeId, topic: &str) -> Result<(), RemoteError> {
        self.record(format!("set_topic {change} {topic}"))?;
        self.topics
            .borrow_mut()
            .insert(change.to_string(), topic.to_string());
        Ok(())
    }

    async fn hashtags(&self, change: &ChangeId) -> Result<Vec<String>, RemoteError> {
        self.record(format!("hashtags {change}"))?;
        Ok(self
            .hashtags
            .borrow()
            .get(change.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn edit_hashtags(
        &self,
        change: &ChangeId,
        edit: &HashtagEdit,
    ) -> Result<Vec<String>, RemoteError> {
        let mut call = format!("edit_hashtags {change}");
        for tag in &edit.add {
            call.push_str(&format!(" +{tag}"));
        }
        for tag in &edit.remove {
            call.push_str(&format!(" -{tag}"));
        }
        self.record(call)?;
        let mut hashtags = self.hashtags.borrow_mut();
        let tags = hashtags.entry(change.to_string()).or_default();
        tags.retain(|tag| !edit.remove.contains(tag));
        for tag in &edit.add {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        Ok(tags.clone())
    }

    async fn transition(
        &self,
        change: &ChangeId,
        transition: StateTransition,
        message: Option<&str>,
    ) -> Result<(), RemoteError> {
        let mut call = format!("{} {change}", transition.endpoint());
        if let Some(message) = message {
            call.push_str(&format!(" {message}"));
        }
        self.record(call)
    }

    async fn robot_comments(
        &self,
        change: &ChangeId,
    ) -> Result<Vec<RobotCommentInfo>, RemoteError> {
        self.record(format!("robot_comments {change}"))?;
        Ok(self
            .robot_comments
            .get(change.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn post_robot_comments(
        &self,
        change: &ChangeId,
        payload: &ReviewPayload,
    ) -> Result<(), RemoteError> {
        self.record(format!("post_robot_comments {change}"))?;
        self.posted_payloads.borrow_mut().push(payload.clone());
        Ok(())
    }
}
