use crate::wire::{
    self, ChangeInfo, MessageInput, OptionalMessageInput, RelatedChangesInfo, RobotCommentWire,
    TopicInput,
};
use gg_core::config::{GerritConfig, Token};
use gg_core::error::{GerritError, RemoteError};
use gg_core::review_payload::ReviewPayload;
use gg_core::server::ReviewServer;
use gg_core::types::{ChangeDetail, ChangeId, HashtagEdit, RobotCommentInfo, StateTransition};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Gerrit prepends this to every JSON response body.
const XSSI_PREFIX: &str = ")]}'";

const DETAIL_OPTIONS: &str = "o=CURRENT_REVISION&o=DETAILED_LABELS";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Authenticated client for the Gerrit REST API.
pub struct GerritClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    token: Token,
}

impl GerritClient {
    pub fn new(config: &GerritConfig) -> Result<Self, GerritError> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    fn with_timeout(config: &GerritConfig, timeout: Duration) -> Result<Self, GerritError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("git-gerrit/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|err| GerritError::Client {
                context: "failed to build http client",
                source: RemoteError::Transport {
                    reason: err.to_string(),
                },
            })?;
        Ok(Self {
            http,
            base_url: config.base_url(),
            user: config.user.clone(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn change_url(&self, change: &ChangeId, endpoint: &str) -> String {
        change_url(&self.base_url, change, endpoint)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&impl Serialize>,
    ) -> Result<String, RemoteError> {
        debug!(%method, url, "gerrit request");
        let mut request = self
            .http
            .request(method, url)
            .basic_auth(&self.user, Some(self.token.expose()));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        debug!(status = status.as_u16(), "gerrit response");
        classify(status, text)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, RemoteError> {
        let body = self.send(Method::GET, url, None::<&()>).await?;
        decode(&body)
    }

    async fn write(
        &self,
        method: Method,
        url: &str,
        body: &impl Serialize,
    ) -> Result<String, RemoteError> {
        self.send(method, url, Some(body)).await
    }
}

impl ReviewServer for GerritClient {
    async fn change_detail(&self, change: &ChangeId) -> Result<ChangeDetail, RemoteError> {
        let url = format!("{}?{DETAIL_OPTIONS}", self.change_url(change, ""));
        let info: ChangeInfo = self.get(&url).await?;
        Ok(info.into_detail(change.clone()))
    }

    async fn related_changes(&self, change: &ChangeId) -> Result<Vec<ChangeId>, RemoteError> {
        let url = self.change_url(change, "/revisions/current/related");
        let related: RelatedChangesInfo = self.get(&url).await?;
        related.into_ids()
    }

    async fn post_review_message(
        &self,
        change: &ChangeId,
        message: &str,
    ) -> Result<(), RemoteError> {
        let url = self.change_url(change, "/revisions/current/review");
        self.write(Method::POST, &url, &MessageInput { message })
            .await
            .map(drop)
    }

    async fn topic(&self, change: &ChangeId) -> Result<Option<String>, RemoteError> {
        let topic: String = self.get(&self.change_url(change, "/topic")).await?;
        Ok(Some(topic).filter(|topic| !topic.is_empty()))
    }

    async fn set_topic(&self, change: &ChangeId, topic: &str) -> Result<(), RemoteError> {
        let url = self.change_url(change, "/topic");
        self.write(Method::PUT, &url, &TopicInput { topic })
            .await
            .map(drop)
    }

    async fn hashtags(&self, change: &ChangeId) -> Result<Vec<String>, RemoteError> {
        self.get(&self.change_url(change, "/hashtags")).await
    }

    async fn edit_hashtags(
        &self,
        change: &ChangeId,
        edit: &HashtagEdit,
    ) -> Result<Vec<String>, RemoteError> {
        let url = self.change_url(change, "/hashtags");
        let body = self.write(Method::POST, &url, edit).await?;
        decode(&body)
    }

    async fn transition(
        &self,
        change: &ChangeId,
        transition: StateTransition,
        message: Option<&str>,
    ) -> Result<(), RemoteError> {
        let url = self.change_url(change, &format!("/{}", transition.endpoint()));
        self.write(Method::POST, &url, &OptionalMessageInput { message })
            .await
            .map(drop)
    }

    async fn robot_comments(
        &self,
        change: &ChangeId,
    ) -> Result<Vec<RobotCommentInfo>, RemoteError> {
        let by_path: BTreeMap<String, Vec<RobotCommentWire>> =
            self.get(&self.change_url(change, "/robotcomments")).await?;
        Ok(wire::robot_comments(by_path))
    }

    async fn post_robot_comments(
        &self,
        change: &ChangeId,
        payload: &ReviewPayload,
    ) -> Result<(), RemoteError> {
        let url = self.change_url(change, "/revisions/current/review");
        self.write(Method::POST, &url, payload).await.map(drop)
    }
}

fn change_url(base_url: &str, change: &ChangeId, endpoint: &str) -> String {
    format!(
        "{base_url}/a/changes/{}{endpoint}",
        encode_segment(change.as_str())
    )
}

/// Project-qualified ids (`project~branch~Id`) may contain `/`.
fn encode_segment(segment: &str) -> String {
    segment.replace('%', "%25").replace('/', "%2F")
}

fn strip_xssi(body: &str) -> &str {
    body.strip_prefix(XSSI_PREFIX)
        .map_or(body, str::trim_start)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
    serde_json::from_str(strip_xssi(body)).map_err(|err| RemoteError::Decode {
        reason: err.to_string(),
    })
}

/// 409 means the change already is in the requested state.
fn classify(status: StatusCode, body: String) -> Result<String, RemoteError> {
    if status.is_success() {
        return Ok(body);
    }
    let message = match body.trim() {
        "" => status.canonical_reason().unwrap_or("no details").to_string(),
        text => text.to_string(),
    };
    Err(match status {
        StatusCode::CONFLICT => RemoteError::Conflict { message },
        StatusCode::NOT_FOUND => RemoteError::NotFound { message },
        other => RemoteError::Http {
            status: other.as_u16(),
            message,
        },
    })
}

fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gg_core::types::NotifyLevel;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, body_json, body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn id(value: &str) -> ChangeId {
        ChangeId::new(value).unwrap()
    }

    #[test]
    fn test_change_url() {
        assert_eq!(
            change_url("https://review.example.org", &id("I1234"), "/topic"),
            "https://review.example.org/a/changes/I1234/topic"
        );
        assert_eq!(
            change_url("https://review.example.org", &id("platform/build~main~I1234"), ""),
            "https://review.example.org/a/changes/platform%2Fbuild~main~I1234"
        );
    }

    #[test]
    fn test_strip_xssi() {
        assert_eq!(strip_xssi(")]}'\n{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_xssi("[1]"), "[1]");
    }

    #[test]
    fn test_decode_topic_string() {
        let topic: String = decode(")]}'\n\"feature-x\"").unwrap();
        assert_eq!(topic, "feature-x");
        let err = decode::<Vec<String>>(")]}'\nnot json").unwrap_err();
        assert!(matches!(err, RemoteError::Decode { .. }));
    }

    #[test]
    fn test_classify_statuses() {
        assert_eq!(classify(StatusCode::OK, "body".to_string()).unwrap(), "body");
        assert_eq!(classify(StatusCode::NO_CONTENT, String::new()).unwrap(), "");
        assert_eq!(
            classify(StatusCode::CONFLICT, "change is not private\n".to_string()),
            Err(RemoteError::Conflict {
                message: "change is not private".to_string()
            })
        );
        assert_eq!(
            classify(StatusCode::NOT_FOUND, "Not found: I1234".to_string()),
            Err(RemoteError::NotFound {
                message: "Not found: I1234".to_string()
            })
        );
        assert_eq!(
            classify(StatusCode::FORBIDDEN, String::new()),
            Err(RemoteError::Http {
                status: 403,
                message: "Forbidden".to_string()
            })
        );
    }

    fn config(host: &str) -> GerritConfig {
        GerritConfig {
            user: "jdoe".to_string(),
            token: Token::new("secret"),
            host: host.to_string(),
            trigger: "runverify".to_string(),
            prevent_build_topic: "NOCI".to_string(),
        }
    }

    fn client_for(server: &MockServer) -> GerritClient {
        GerritClient::new(&config(&server.uri())).unwrap()
    }

    fn gerrit_json(body: &serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(format!(")]}}'\n{body}"), "application/json")
    }

    #[test]
    fn test_client_uses_configured_host() {
        let client = GerritClient::new(&config("review.example.org")).unwrap();
        assert_eq!(client.base_url(), "https://review.example.org");
        assert_eq!(
            client.change_url(&id("42"), "/wip"),
            "https://review.example.org/a/changes/42/wip"
        );
    }

    #[tokio::test]
    async fn test_set_topic_puts_topic_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/a/changes/I1234/topic"))
            .and(basic_auth("jdoe", "secret"))
            .and(body_json(json!({"topic": "feature-x"})))
            .respond_with(gerrit_json(&json!("feature-x")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.set_topic(&id("I1234"), "feature-x").await.unwrap();
    }

    #[tokio::test]
    async fn test_make_public_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/a/changes/platform%2Fbuild~main~I1234/private.delete"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(409).set_body_string("change is not private"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .transition(&id("platform/build~main~I1234"), StateTransition::Public, None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RemoteError::Conflict {
                message: "change is not private".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_abandon_sends_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/a/changes/42/abandon"))
            .and(body_json(json!({"message": "superseded"})))
            .respond_with(gerrit_json(&json!({"_number": 42})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .transition(&id("42"), StateTransition::Abandon, Some("superseded"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_related_changes_decode_after_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a/changes/I1234/revisions/current/related"))
            .respond_with(gerrit_json(&json!({
                "changes": [
                    {"change_id": "I9999", "_change_number": 1002},
                    {"change_id": "I1234", "_change_number": 1001}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let related = client.related_changes(&id("I1234")).await.unwrap();
        assert_eq!(related, vec![id("1002"), id("1001")]);
    }

    #[tokio::test]
    async fn test_change_detail_requests_labels() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a/changes/1001"))
            .and(query_param("o", "DETAILED_LABELS"))
            .respond_with(gerrit_json(&json!({
                "_number": 1001,
                "project": "tools",
                "branch": "main",
                "subject": "Fix build",
                "status": "NEW",
                "labels": {"Verified": {"all": [{"username": "ci", "value": 1}]}}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let detail = client.change_detail(&id("1001")).await.unwrap();
        assert_eq!(detail.subject, "Fix build");
        assert_eq!(detail.non_zero_votes("Verified").len(), 1);
    }

    #[tokio::test]
    async fn test_empty_topic_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a/changes/I1234/topic"))
            .respond_with(gerrit_json(&json!("")))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.topic(&id("I1234")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_post_robot_comments_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/a/changes/I1234/revisions/current/review"))
            .and(body_partial_json(json!({
                "omit_duplicate_comments": true,
                "notify": "OWNER"
            })))
            .respond_with(gerrit_json(&json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let payload = ReviewPayload {
            message: None,
            tag: None,
            labels: None,
            robot_comments: BTreeMap::new(),
            omit_duplicate_comments: true,
            notify: NotifyLevel::Owner,
        };
        let client = client_for(&server);
        client
            .post_robot_comments(&id("I1234"), &payload)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_change_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a/changes/I0000/hashtags"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not found: I0000"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.hashtags(&id("I0000")).await.unwrap_err();
        assert!(matches!(err, RemoteError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unresponsive_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(gerrit_json(&json!([])).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client =
            GerritClient::with_timeout(&config(&server.uri()), Duration::from_millis(200)).unwrap();
        let err = client.hashtags(&id("I1234")).await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport { .. }));
    }
}
