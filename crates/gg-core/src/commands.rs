use crate::config::GerritConfig;
use crate::error::{GerritError, RemoteError, ResolutionError};
use crate::review_payload::ReviewPayload;
use crate::server::ReviewServer;
use crate::types::{ChangeChain, ChangeId, HashtagEdit, RobotCommentInfo, StateTransition, Vote};
use tracing::{info, warn};

/// Labels whose votes `runverify --check` reports.
pub const VERIFY_LABELS: [&str; 2] = ["Code-Review", "Verified"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The server answered with a conflict: the change already was in the requested state.
    Unchanged { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    pub change: ChangeId,
    pub action: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyStatus {
    pub change: ChangeId,
    pub subject: String,
    pub link: String,
    pub votes: Vec<(String, Vote)>,
}

/// What a command did or found, rendered by the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Verify(Vec<VerifyStatus>),
    Topics(Vec<(ChangeId, Option<String>)>),
    Hashtags(Vec<(ChangeId, Vec<String>)>),
    Applied(Vec<AppliedChange>),
    RobotComments {
        change: ChangeId,
        comments: Vec<RobotCommentInfo>,
    },
}

/// Runs sub-commands over a resolved chain, one server call per change, in chain order.
///
/// A conflict for one change is recorded as [`Outcome::Unchanged`] and the chain carries on.
/// Any other failure stops the command; changes already updated stay updated.
pub struct Dispatcher<'a, S: ReviewServer> {
    server: &'a S,
    config: &'a GerritConfig,
}

impl<'a, S: ReviewServer> Dispatcher<'a, S> {
    pub fn new(server: &'a S, config: &'a GerritConfig) -> Self {
        Self { server, config }
    }

    pub async fn runverify_status(&self, chain: &ChangeChain) -> Result<Report, GerritError> {
        let base_url = self.config.base_url();
        let mut statuses = Vec::new();
        for change in chain {
            let detail = self
                .server
                .change_detail(change)
                .await
                .map_err(GerritError::remote(change))?;
            let votes = VERIFY_LABELS
                .iter()
                .flat_map(|label| {
                    detail
                        .non_zero_votes(label)
                        .into_iter()
                        .map(|vote| ((*label).to_string(), vote.clone()))
                })
                .collect();
            statuses.push(VerifyStatus {
                change: change.clone(),
                subject: detail.subject.clone(),
                link: detail.web_link(&base_url),
                votes,
            });
        }
        Ok(Report::Verify(statuses))
    }

    pub async fn runverify(&self, chain: &ChangeChain) -> Result<Report, GerritError> {
        let trigger = self.config.trigger.as_str();
        let mut applied = Vec::new();
        for change in chain {
            let result = self.server.post_review_message(change, trigger).await;
            applied.push(settle(change, &format!("comment '{trigger}'"), result)?);
        }
        Ok(Report::Applied(applied))
    }

    pub async fn topics(&self, chain: &ChangeChain) -> Result<Report, GerritError> {
        let mut topics = Vec::new();
        for change in chain {
            let topic = self
                .server
                .topic(change)
                .await
                .map_err(GerritError::remote(change))?;
            topics.push((change.clone(), topic));
        }
        Ok(Report::Topics(topics))
    }

    /// Sets `topic` across the chain. The prevent-build topic never lands on the top of a
    /// chain, so the top change still triggers CI for the whole stack.
    pub async fn set_topic(
        &self,
        chain: &ChangeChain,
        topic: &str,
        support_chain: bool,
    ) -> Result<Report, GerritError> {
        let prevents_build = topic == self.config.prevent_build_topic;
        let targets: &[ChangeId] = if chain.is_single() {
            if support_chain && prevents_build {
                return Err(ResolutionError::LonePreventBuild {
                    change: chain.top().clone(),
                    topic: topic.to_string(),
                }
                .into());
            }
            chain.ids()
        } else if prevents_build {
            chain.ancestors()
        } else {
            chain.ids()
        };

        let action = format!("set topic '{topic}'");
        let mut applied = Vec::new();
        for change in targets {
            let result = self.server.set_topic(change, topic).await;
            applied.push(settle(change, &action, result)?);
        }
        Ok(Report::Applied(applied))
    }

    pub async fn hashtags(&self, chain: &ChangeChain) -> Result<Report, GerritError> {
        let mut hashtags = Vec::new();
        for change in chain {
            let tags = self
                .server
                .hashtags(change)
                .await
                .map_err(GerritError::remote(change))?;
            hashtags.push((change.clone(), tags));
        }
        Ok(Report::Hashtags(hashtags))
    }

    pub async fn edit_hashtags(
        &self,
        chain: &ChangeChain,
        edit: &HashtagEdit,
    ) -> Result<Report, GerritError> {
        let action = describe_hashtag_edit(edit);
        let mut applied = Vec::new();
        for change in chain {
            let result = self.server.edit_hashtags(change, edit).await.map(drop);
            applied.push(settle(change, &action, result)?);
        }
        Ok(Report::Applied(applied))
    }

    pub async fn transition(
        &self,
        chain: &ChangeChain,
        transition: StateTransition,
        message: Option<&str>,
    ) -> Result<Report, GerritError> {
        let action = transition.to_string();
        let mut applied = Vec::new();
        for change in chain {
            let result = self.server.transition(change, transition, message).await;
            applied.push(settle(change, &action, result)?);
        }
        Ok(Report::Applied(applied))
    }

    /// Readies a chain for review: every change gets the top change's topic as a hashtag
    /// and is made public and ready, then everything below the top is parked on the
    /// prevent-build topic.
    pub async fn prepare(&self, chain: &ChangeChain) -> Result<Report, GerritError> {
        let top = chain.top();
        let topic = self
            .server
            .topic(top)
            .await
            .map_err(GerritError::remote(top))?
            .filter(|topic| !topic.is_empty());
        let tag_edit = topic.as_ref().map(|topic| HashtagEdit {
            add: vec![topic.clone()],
            remove: Vec::new(),
        });
        if tag_edit.is_none() {
            warn!(change = %top, "top of chain has no topic, skipping hashtags");
        }

        let mut applied = Vec::new();
        for change in chain {
            if let Some(edit) = &tag_edit {
                let result = self.server.edit_hashtags(change, edit).await.map(drop);
                applied.push(settle(change, &describe_hashtag_edit(edit), result)?);
            }
            for transition in [StateTransition::Public, StateTransition::Ready] {
                let result = self.server.transition(change, transition, None).await;
                applied.push(settle(change, &transition.to_string(), result)?);
            }
        }

        let prevent = self.config.prevent_build_topic.as_str();
        let action = format!("set topic '{prevent}'");
        for change in chain.ancestors() {
            let result = self.server.set_topic(change, prevent).await;
            applied.push(settle(change, &action, result)?);
        }
        Ok(Report::Applied(applied))
    }

    pub async fn robot_comments(&self, chain: &ChangeChain) -> Result<Report, GerritError> {
        let change = chain.top();
        let comments = self
            .server
            .robot_comments(change)
            .await
            .map_err(GerritError::remote(change))?;
        Ok(Report::RobotComments {
            change: change.clone(),
            comments,
        })
    }

    /// Posts robot comments on the top change only.
    pub async fn review(
        &self,
        chain: &ChangeChain,
        payload: &ReviewPayload,
    ) -> Result<Report, GerritError> {
        let change = chain.top();
        let action = format!("post {} robot comments", payload.comment_count());
        let result = self.server.post_robot_comments(change, payload).await;
        Ok(Report::Applied(vec![settle(change, &action, result)?]))
    }
}

/// Conflicts are accepted as "already done"; everything else is fatal for the command.
fn settle(
    change: &ChangeId,
    action: &str,
    result: Result<(), RemoteError>,
) -> Result<AppliedChange, GerritError> {
    let outcome = match result {
        Ok(()) => {
            info!(%change, action, "applied");
            Outcome::Applied
        }
        Err(RemoteError::Conflict { message }) => {
            warn!(%change, action, reason = %message, "already in requested state");
            Outcome::Unchanged { reason: message }
        }
        Err(source) => {
            return Err(GerritError::Remote {
                change: change.clone(),
                source,
            });
        }
    };
    Ok(AppliedChange {
        change: change.clone(),
        action: action.to_string(),
        outcome,
    })
}

fn describe_hashtag_edit(edit: &HashtagEdit) -> String {
    let mut parts = Vec::new();
    if !edit.add.is_empty() {
        parts.push(format!("add hashtags {}", edit.add.join(", ")));
    }
    if !edit.remove.is_empty() {
        parts.push(format!("remove hashtags {}", edit.remove.join(", ")));
    }
    parts.join("; ")
}
