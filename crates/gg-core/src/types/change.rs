use crate::types::ids::ChangeId;
use std::collections::BTreeMap;

/// Changes to operate on, top of the stack first. Never empty, never repeats an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeChain(Vec<ChangeId>);

impl ChangeChain {
    pub fn single(change: ChangeId) -> Self {
        Self(vec![change])
    }

    /// Keeps the first occurrence of every id; `None` when nothing is left.
    pub fn from_ids(ids: impl IntoIterator<Item = ChangeId>) -> Option<Self> {
        let mut chain: Vec<ChangeId> = Vec::new();
        for id in ids {
            if !chain.contains(&id) {
                chain.push(id);
            }
        }
        if chain.is_empty() {
            None
        } else {
            Some(Self(chain))
        }
    }

    pub fn top(&self) -> &ChangeId {
        &self.0[0]
    }

    /// Everything below the top of the chain.
    pub fn ancestors(&self) -> &[ChangeId] {
        &self.0[1..]
    }

    pub fn ids(&self) -> &[ChangeId] {
        &self.0
    }

    pub fn is_single(&self) -> bool {
        self.0.len() == 1
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeId> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a ChangeChain {
    type Item = &'a ChangeId;
    type IntoIter = std::slice::Iter<'a, ChangeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub account: String,
    pub value: i32,
}

/// Server-side state of one change, fetched fresh for every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDetail {
    pub id: ChangeId,
    pub number: u64,
    pub project: String,
    pub branch: String,
    pub subject: String,
    pub status: String,
    pub topic: Option<String>,
    pub hashtags: Vec<String>,
    pub current_revision: Option<u32>,
    pub labels: BTreeMap<String, Vec<Vote>>,
}

impl ChangeDetail {
    pub fn web_link(&self, base_url: &str) -> String {
        format!("{base_url}/c/{}/+/{}", self.project, self.number)
    }

    pub fn non_zero_votes(&self, label: &str) -> Vec<&Vote> {
        self.labels
            .get(label)
            .map(|votes| votes.iter().filter(|vote| vote.value != 0).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotCommentInfo {
    pub path: String,
    pub line: Option<u32>,
    pub robot_id: String,
    pub robot_run_id: Option<String>,
    pub message: String,
}
