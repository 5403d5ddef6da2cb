//! GitHub REST API payload types.
//!
//! Only the fields the mirror stores are modeled; everything else in the
//! upstream JSON is ignored during deserialization.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::PlatformError;

/// A user as it appears in listings (stub) or from `GET /users/{login}` (full).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GhOrganization {
    pub login: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GhRepository {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub owner: GhUser,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub watchers_count: i32,
    #[serde(default)]
    pub stargazers_count: i32,
    #[serde(default)]
    pub forks_count: i32,
    #[serde(default)]
    pub open_issues_count: i32,
}

impl GhRepository {
    /// `owner/name`, derived from the owner when the API omits `full_name`.
    pub fn full_name(&self) -> String {
        self.full_name
            .clone()
            .unwrap_or_else(|| format!("{}/{}", self.owner.login, self.name))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GhLabel {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhIssue {
    pub number: i64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<GhLabel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    pub state: String,
    #[serde(default)]
    pub user: Option<GhUser>,
    #[serde(default)]
    pub assignees: Vec<GhUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhIssueComment {
    pub id: i64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<GhUser>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `https://api.github.com/repos/{org}/{repo}/issues/{number}`
    #[serde(default)]
    pub issue_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GhCommitRef {
    #[serde(default)]
    pub sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhPullRequest {
    pub number: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<GhLabel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub user: Option<GhUser>,
    #[serde(default)]
    pub assignees: Vec<GhUser>,
    #[serde(default)]
    pub requested_reviewers: Vec<GhUser>,
    #[serde(default)]
    pub base: GhCommitRef,
    #[serde(default)]
    pub head: GhCommitRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhReview {
    pub id: i64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<GhUser>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhReviewComment {
    pub id: i64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<GhUser>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `https://api.github.com/repos/{org}/{repo}/pulls/{number}`
    #[serde(default)]
    pub pull_request_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhRepoComment {
    pub id: i64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<GhUser>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub commit_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhPullRequestFile {
    pub filename: String,
}

/// An entry of `GET /repos/{org}/{repo}/events`.
///
/// The payload shape depends on `kind`; it is decoded lazily by the event
/// dispatch table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub actor: Option<GhUser>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// An entry of `GET /repos/{org}/{repo}/issues/events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhIssueEvent {
    pub id: i64,
    #[serde(default)]
    pub actor: Option<GhUser>,
    pub event: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub issue: Option<GhNumberRef>,
}

/// File metadata from the contents API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GhContent {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl GhContent {
    /// The file body as text.
    ///
    /// GitHub wraps base64 content at 60 columns, so line breaks are removed
    /// before decoding.
    pub fn decoded(&self) -> Result<String, PlatformError> {
        let raw = self
            .content
            .as_deref()
            .ok_or_else(|| PlatformError::decode(format!("{} has no content", self.path)))?;

        match self.encoding.as_deref() {
            Some("base64") => {
                let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = BASE64
                    .decode(compact)
                    .map_err(|e| PlatformError::decode(format!("{}: {e}", self.path)))?;
                String::from_utf8(bytes)
                    .map_err(|e| PlatformError::decode(format!("{}: {e}", self.path)))
            }
            Some("") | None => Ok(raw.to_string()),
            Some(other) => Err(PlatformError::decode(format!(
                "{}: unsupported encoding {other}",
                self.path
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhTreeEntry {
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhTree {
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub tree: Vec<GhTreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhCommit {
    pub sha: String,
}

// ─── Event payloads ──────────────────────────────────────────────────────────
//
// Repository event feeds only need subject identifiers, so these are looser
// than the webhook payloads handled by the refresher.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GhNumberRef {
    pub number: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GhIdRef {
    pub id: i64,
}

/// `IssuesEvent` (and the older `IssueEvent` shape, which carries `event` instead of `action`).
#[derive(Debug, Clone, Deserialize)]
pub struct IssueActivity {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    pub issue: GhNumberRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentActivity {
    #[serde(default)]
    pub action: Option<String>,
    pub issue: GhNumberRef,
    pub comment: GhIdRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestActivity {
    #[serde(default)]
    pub action: Option<String>,
    pub pull_request: GhNumberRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCommentActivity {
    #[serde(default)]
    pub action: Option<String>,
    pub pull_request: GhNumberRef,
    pub comment: GhIdRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewActivity {
    #[serde(default)]
    pub action: Option<String>,
    pub pull_request: GhNumberRef,
    pub review: GhIdRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitCommentActivity {
    #[serde(default)]
    pub action: Option<String>,
    pub comment: GhIdRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wrapped_base64_content() {
        let content = GhContent {
            path: "CODEOWNERS".to_string(),
            content: Some("KiBAYWxp\nY2UK\n".to_string()),
            encoding: Some("base64".to_string()),
        };
        assert_eq!(content.decoded().unwrap(), "* @alice\n");
    }

    #[test]
    fn rejects_unknown_encoding() {
        let content = GhContent {
            path: "CODEOWNERS".to_string(),
            content: Some("x".to_string()),
            encoding: Some("rot13".to_string()),
        };
        assert!(content.decoded().is_err());
    }

    #[test]
    fn event_kind_comes_from_type_field() {
        let event: GhEvent = serde_json::from_value(serde_json::json!({
            "id": "1",
            "type": "PullRequestEvent",
            "actor": {"login": "alice"},
            "created_at": "2024-05-01T12:00:00Z",
            "payload": {"action": "opened", "pull_request": {"number": 7}}
        }))
        .unwrap();

        assert_eq!(event.kind.as_deref(), Some("PullRequestEvent"));
        let payload: PullRequestActivity = serde_json::from_value(event.payload).unwrap();
        assert_eq!(payload.pull_request.number, 7);
    }

    #[test]
    fn repository_full_name_falls_back_to_owner() {
        let repo: GhRepository = serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "bots",
            "owner": {"login": "istio"}
        }))
        .unwrap();
        assert_eq!(repo.full_name(), "istio/bots");
        assert_eq!(repo.default_branch, None);
    }
}
