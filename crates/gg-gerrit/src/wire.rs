//! JSON shapes of the Gerrit REST API, reduced to the fields this tool reads.

use gg_core::error::RemoteError;
use gg_core::types::{ChangeDetail, ChangeId, RobotCommentInfo, Vote};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Deserialize)]
pub(crate) struct ChangeInfo {
    #[serde(rename = "_number")]
    pub number: u64,
    pub project: String,
    pub branch: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub current_revision: Option<String>,
    #[serde(default)]
    pub revisions: HashMap<String, RevisionInfo>,
    #[serde(default)]
    pub labels: BTreeMap<String, LabelInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevisionInfo {
    #[serde(rename = "_number")]
    pub number: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LabelInfo {
    #[serde(default)]
    pub all: Vec<ApprovalInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApprovalInfo {
    #[serde(rename = "_account_id")]
    pub account_id: Option<u64>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub value: Option<i32>,
}

impl ApprovalInfo {
    fn account(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.name.clone())
            .or_else(|| self.email.clone())
            .or_else(|| self.account_id.map(|id| format!("account {id}")))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl ChangeInfo {
    /// The detail is keyed by the id it was requested with, whatever form that was.
    pub fn into_detail(self, id: ChangeId) -> ChangeDetail {
        let current_revision = self
            .current_revision
            .as_ref()
            .and_then(|sha| self.revisions.get(sha))
            .map(|revision| revision.number);
        let labels = self
            .labels
            .into_iter()
            .map(|(label, info)| {
                let votes = info
                    .all
                    .iter()
                    .map(|approval| Vote {
                        account: approval.account(),
                        value: approval.value.unwrap_or(0),
                    })
                    .collect();
                (label, votes)
            })
            .collect();
        ChangeDetail {
            id,
            number: self.number,
            project: self.project,
            branch: self.branch,
            subject: self.subject,
            status: self.status,
            topic: self.topic.filter(|topic| !topic.is_empty()),
            hashtags: self.hashtags,
            current_revision,
            labels,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RelatedChangesInfo {
    #[serde(default)]
    pub changes: Vec<RelatedChangeAndCommitInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RelatedChangeAndCommitInfo {
    #[serde(rename = "_change_number")]
    pub change_number: Option<u64>,
    pub change_id: Option<String>,
}

impl RelatedChangesInfo {
    /// Change numbers where the server has them; they stay unique across branches.
    pub fn into_ids(self) -> Result<Vec<ChangeId>, RemoteError> {
        self.changes
            .into_iter()
            .filter_map(|related| {
                related
                    .change_number
                    .map(|number| number.to_string())
                    .or(related.change_id)
            })
            .map(|raw| {
                ChangeId::new(raw).map_err(|err| RemoteError::Decode {
                    reason: err.to_string(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RobotCommentWire {
    pub robot_id: String,
    pub robot_run_id: Option<String>,
    pub line: Option<u32>,
    #[serde(default)]
    pub message: String,
}

pub(crate) fn robot_comments(
    by_path: BTreeMap<String, Vec<RobotCommentWire>>,
) -> Vec<RobotCommentInfo> {
    by_path
        .into_iter()
        .flat_map(|(path, comments)| {
            comments.into_iter().map(move |comment| RobotCommentInfo {
                path: path.clone(),
                line: comment.line,
                robot_id: comment.robot_id,
                robot_run_id: comment.robot_run_id,
                message: comment.message,
            })
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageInput<'a> {
    pub message: &'a str,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct OptionalMessageInput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicInput<'a> {
    pub topic: &'a str,
}
