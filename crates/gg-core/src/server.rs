use crate::error::RemoteError;
use crate::review_payload::ReviewPayload;
use crate::types::{ChangeDetail, ChangeId, HashtagEdit, RobotCommentInfo, StateTransition};

/// The Gerrit operations this tool needs. A 409 from the server must surface as
/// [`RemoteError::Conflict`] so callers can treat "already in that state" as success.
#[allow(async_fn_in_trait)]
pub trait ReviewServer {
    async fn change_detail(&self, change: &ChangeId) -> Result<ChangeDetail, RemoteError>;

    /// Changes related to `change`, top of the stack first. Empty when it stands alone.
    async fn related_changes(&self, change: &ChangeId) -> Result<Vec<ChangeId>, RemoteError>;

    /// Posts `message` on the current revision.
    async fn post_review_message(&self, change: &ChangeId, message: &str)
    -> Result<(), RemoteError>;

    async fn topic(&self, change: &ChangeId) -> Result<Option<String>, RemoteError>;

    async fn set_topic(&self, change: &ChangeId, topic: &str) -> Result<(), RemoteError>;

    async fn hashtags(&self, change: &ChangeId) -> Result<Vec<String>, RemoteError>;

    async fn edit_hashtags(
        &self,
        change: &ChangeId,
        edit: &HashtagEdit,
    ) -> Result<Vec<String>, RemoteError>;

    async fn transition(
        &self,
        change: &ChangeId,
        transition: StateTransition,
        message: Option<&str>,
    ) -> Result<(), RemoteError>;

    async fn robot_comments(&self, change: &ChangeId)
    -> Result<Vec<RobotCommentInfo>, RemoteError>;

    /// Posts robot comments on the current revision.
    async fn post_robot_comments(
        &self,
        change: &ChangeId,
        payload: &ReviewPayload,
    ) -> Result<(), RemoteError>;
}
