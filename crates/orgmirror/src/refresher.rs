//! Live mirror updates from GitHub webhook deliveries.
//!
//! Each delivery is converted with the same functions the batch sync uses, so
//! a record written here has exactly the shape the next sync would write for
//! the same upstream entity. The refresher never touches sync bookmarks: a
//! delivery is applied once, as received.
//!
//! ```ignore
//! let event = WebhookEvent::parse(headers["X-GitHub-Event"], &body)?;
//! match refresher.handle(event).await {
//!     RefreshOutcome::Applied { .. } => {}
//!     other => tracing::debug!(?other, "delivery not applied"),
//! }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::cache::{Cache, CacheError};
use crate::entity::{
    issue_comment_event, issue_event, pull_request_event, pull_request_review_comment_event,
    pull_request_review_event, repo_comment_event, user,
};
use crate::github::convert::{
    convert_issue, convert_issue_comment, convert_pull_request, convert_pull_request_review,
    convert_pull_request_review_comment, convert_repo_comment,
};
use crate::github::types::{
    GhIssue, GhIssueComment, GhNumberRef, GhPullRequest, GhRepoComment, GhRepository, GhReview,
    GhReviewComment, GhUser,
};
use crate::platform::{GitHubApi, PlatformError};
use crate::store::{Store, StoreError};
use crate::sync::OrgSpec;

#[derive(Debug, Clone, Deserialize)]
pub struct IssuesPayload {
    #[serde(default)]
    pub action: String,
    pub issue: GhIssue,
    pub repository: GhRepository,
    #[serde(default)]
    pub sender: Option<GhUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentPayload {
    #[serde(default)]
    pub action: String,
    pub issue: GhNumberRef,
    pub comment: GhIssueComment,
    pub repository: GhRepository,
    #[serde(default)]
    pub sender: Option<GhUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPayload {
    #[serde(default)]
    pub action: String,
    pub pull_request: GhPullRequest,
    pub repository: GhRepository,
    #[serde(default)]
    pub sender: Option<GhUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestReviewPayload {
    #[serde(default)]
    pub action: String,
    pub review: GhReview,
    pub pull_request: GhNumberRef,
    pub repository: GhRepository,
    #[serde(default)]
    pub sender: Option<GhUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestReviewCommentPayload {
    #[serde(default)]
    pub action: String,
    pub comment: GhReviewComment,
    pub pull_request: GhNumberRef,
    pub repository: GhRepository,
    #[serde(default)]
    pub sender: Option<GhUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitCommentPayload {
    #[serde(default)]
    pub action: String,
    pub comment: GhRepoComment,
    pub repository: GhRepository,
    #[serde(default)]
    pub sender: Option<GhUser>,
}

/// A webhook delivery, keyed by its `X-GitHub-Event` name.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Issues(IssuesPayload),
    IssueComment(IssueCommentPayload),
    PullRequest(PullRequestPayload),
    PullRequestReview(PullRequestReviewPayload),
    PullRequestReviewComment(PullRequestReviewCommentPayload),
    CommitComment(CommitCommentPayload),
    /// An event type the mirror does not record.
    Ignored { event: String },
}

impl WebhookEvent {
    /// Decode a delivery body. Unknown event names are not an error.
    pub fn parse(event: &str, payload: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(match event {
            "issues" => Self::Issues(serde_json::from_slice(payload)?),
            "issue_comment" => Self::IssueComment(serde_json::from_slice(payload)?),
            "pull_request" => Self::PullRequest(serde_json::from_slice(payload)?),
            "pull_request_review" => Self::PullRequestReview(serde_json::from_slice(payload)?),
            "pull_request_review_comment" => {
                Self::PullRequestReviewComment(serde_json::from_slice(payload)?)
            }
            "commit_comment" => Self::CommitComment(serde_json::from_slice(payload)?),
            other => Self::Ignored {
                event: other.to_string(),
            },
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Issues(_) => "issues",
            Self::IssueComment(_) => "issue_comment",
            Self::PullRequest(_) => "pull_request",
            Self::PullRequestReview(_) => "pull_request_review",
            Self::PullRequestReviewComment(_) => "pull_request_review_comment",
            Self::CommitComment(_) => "commit_comment",
            Self::Ignored { event } => event,
        }
    }

    pub fn repository(&self) -> Option<&GhRepository> {
        match self {
            Self::Issues(p) => Some(&p.repository),
            Self::IssueComment(p) => Some(&p.repository),
            Self::PullRequest(p) => Some(&p.repository),
            Self::PullRequestReview(p) => Some(&p.repository),
            Self::PullRequestReviewComment(p) => Some(&p.repository),
            Self::CommitComment(p) => Some(&p.repository),
            Self::Ignored { .. } => None,
        }
    }
}

/// What became of one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The entity, its event and any discovered users were written.
    Applied { org: String, repo: String },
    /// The repository is not mirrored.
    NotMonitored { repo: String },
    /// The event type is not recorded.
    Unsupported { event: String },
    /// Something failed; the error has been logged.
    Failed { message: String },
}

#[derive(Debug, Error)]
enum RefreshError {
    #[error("upstream: {0}")]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which repositories deliveries are accepted for.
///
/// An organization configured without a repository list accepts every
/// repository it owns.
#[derive(Debug, Clone, Default)]
pub struct MonitoredRepos {
    whole_orgs: HashSet<String>,
    repos: HashSet<String>,
}

impl MonitoredRepos {
    pub fn from_specs(orgs: &[OrgSpec]) -> Self {
        let mut monitored = Self::default();
        for org in orgs {
            if org.repos.is_empty() {
                monitored.whole_orgs.insert(org.name.clone());
            } else {
                monitored
                    .repos
                    .extend(org.repos.iter().map(|repo| format!("{}/{repo}", org.name)));
            }
        }
        monitored
    }

    pub fn contains(&self, org: &str, repo: &str) -> bool {
        self.whole_orgs.contains(org) || self.repos.contains(&format!("{org}/{repo}"))
    }
}

fn login_of(user: Option<&GhUser>) -> String {
    user.map(|u| u.login.clone()).unwrap_or_default()
}

/// Applies webhook deliveries to the mirror.
pub struct Refresher {
    monitored: MonitoredRepos,
    cache: Arc<dyn Cache>,
    store: Arc<dyn Store>,
    github: Arc<dyn GitHubApi>,
}

impl Refresher {
    pub fn new(
        cache: Arc<dyn Cache>,
        store: Arc<dyn Store>,
        github: Arc<dyn GitHubApi>,
        orgs: &[OrgSpec],
    ) -> Self {
        Self {
            monitored: MonitoredRepos::from_specs(orgs),
            cache,
            store,
            github,
        }
    }

    /// Apply one delivery. Failures are logged and reported in the outcome,
    /// never returned as errors.
    pub async fn handle(&self, event: WebhookEvent) -> RefreshOutcome {
        let Some(repository) = event.repository() else {
            debug!(event = event.name(), "Unknown event received");
            return RefreshOutcome::Unsupported {
                event: event.name().to_string(),
            };
        };

        let org = repository.owner.login.clone();
        let repo = repository.name.clone();
        info!(event = event.name(), org = %org, repo = %repo, "Received webhook event");

        if !self.monitored.contains(&org, &repo) {
            info!(org = %org, repo = %repo, "Ignoring event since it's not in a monitored repo");
            return RefreshOutcome::NotMonitored {
                repo: format!("{org}/{repo}"),
            };
        }

        match self.apply(&org, &repo, event).await {
            Ok(()) => RefreshOutcome::Applied { org, repo },
            Err(e) => {
                error!(org = %org, repo = %repo, error = %e, "unable to apply webhook event");
                RefreshOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn apply(
        &self,
        org: &str,
        repo: &str,
        event: WebhookEvent,
    ) -> Result<(), RefreshError> {
        let received = Utc::now();

        let users = match event {
            WebhookEvent::Issues(p) => {
                let (issue, users) = convert_issue(org, repo, &p.issue);
                let number = issue.issue_number;
                self.cache.write_issues(vec![issue]).await?;
                self.store
                    .write_issue_events(vec![issue_event::Model {
                        org_login: org.to_string(),
                        repo_name: repo.to_string(),
                        issue_number: number,
                        created_at: received,
                        actor: login_of(p.sender.as_ref()),
                        action: p.action,
                    }])
                    .await?;
                users
            }
            WebhookEvent::IssueComment(p) => {
                let mut comment = p.comment;
                if comment.issue_url.is_empty() {
                    comment.issue_url = p.issue.number.to_string();
                }
                let (comment, users) = convert_issue_comment(org, repo, &comment)?;
                let (number, id) = (comment.issue_number, comment.issue_comment_id);
                self.cache.write_issue_comments(vec![comment]).await?;
                self.store
                    .write_issue_comment_events(vec![issue_comment_event::Model {
                        org_login: org.to_string(),
                        repo_name: repo.to_string(),
                        issue_number: number,
                        issue_comment_id: id,
                        created_at: received,
                        actor: login_of(p.sender.as_ref()),
                        action: p.action,
                    }])
                    .await?;
                users
            }
            WebhookEvent::PullRequest(p) => {
                // The payload carries no file list.
                let number = p.pull_request.number;
                let mut files = Vec::new();
                let mut page = Some(1);
                while let Some(n) = page {
                    let fetched = self
                        .github
                        .list_pull_request_files(org, repo, number, n)
                        .await?;
                    files.extend(fetched.items);
                    page = fetched.next_page;
                }

                let (pr, users) = convert_pull_request(org, repo, &p.pull_request, &files);
                self.cache.write_pull_requests(vec![pr]).await?;
                self.store
                    .write_pull_request_events(vec![pull_request_event::Model {
                        org_login: org.to_string(),
                        repo_name: repo.to_string(),
                        pull_request_number: number,
                        created_at: received,
                        actor: login_of(p.sender.as_ref()),
                        action: p.action,
                    }])
                    .await?;
                users
            }
            WebhookEvent::PullRequestReview(p) => {
                let number = p.pull_request.number;
                let (review, users) = convert_pull_request_review(org, repo, number, &p.review);
                let id = review.pull_request_review_id;
                self.cache.write_pull_request_reviews(vec![review]).await?;
                self.store
                    .write_pull_request_review_events(vec![pull_request_review_event::Model {
                        org_login: org.to_string(),
                        repo_name: repo.to_string(),
                        pull_request_number: number,
                        pull_request_review_id: id,
                        created_at: received,
                        actor: login_of(p.sender.as_ref()),
                        action: p.action,
                    }])
                    .await?;
                users
            }
            WebhookEvent::PullRequestReviewComment(p) => {
                let mut comment = p.comment;
                if comment.pull_request_url.is_empty() {
                    comment.pull_request_url = p.pull_request.number.to_string();
                }
                let (comment, users) = convert_pull_request_review_comment(org, repo, &comment)?;
                let (number, id) = (
                    comment.pull_request_number,
                    comment.pull_request_review_comment_id,
                );
                self.cache
                    .write_pull_request_review_comments(vec![comment])
                    .await?;
                self.store
                    .write_pull_request_review_comment_events(vec![
                        pull_request_review_comment_event::Model {
                            org_login: org.to_string(),
                            repo_name: repo.to_string(),
                            pull_request_number: number,
                            pull_request_review_comment_id: id,
                            created_at: received,
                            actor: login_of(p.sender.as_ref()),
                            action: p.action,
                        },
                    ])
                    .await?;
                users
            }
            WebhookEvent::CommitComment(p) => {
                let (comment, users) = convert_repo_comment(org, repo, &p.comment);
                let id = comment.repo_comment_id;
                self.cache.write_repo_comments(vec![comment]).await?;
                self.store
                    .write_repo_comment_events(vec![repo_comment_event::Model {
                        org_login: org.to_string(),
                        repo_name: repo.to_string(),
                        repo_comment_id: id,
                        created_at: received,
                        actor: login_of(p.sender.as_ref()),
                        action: p.action,
                    }])
                    .await?;
                users
            }
            WebhookEvent::Ignored { .. } => Vec::new(),
        };

        self.write_users(users).await
    }

    async fn write_users(&self, users: Vec<user::Model>) -> Result<(), RefreshError> {
        if users.is_empty() {
            return Ok(());
        }
        self.cache.write_users(users).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ReadThroughCache;
    use crate::store::MemoryStore;
    use crate::test_support::FakeGitHub;
    use serde_json::json;

    fn repository(org: &str, name: &str) -> serde_json::Value {
        json!({"id": 1, "name": name, "owner": {"login": org}})
    }

    fn refresher(store: Arc<MemoryStore>, github: FakeGitHub, orgs: &[OrgSpec]) -> Refresher {
        let cache = Arc::new(ReadThroughCache::new(Arc::clone(&store)));
        Refresher::new(cache, store, Arc::new(github), orgs)
    }

    fn issues_delivery(org: &str, repo: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "action": "opened",
            "issue": {
                "number": 17,
                "title": "crash on start",
                "created_at": "2024-05-01T12:00:00Z",
                "updated_at": "2024-05-01T12:00:00Z",
                "state": "open",
                "user": {"login": "alice"}
            },
            "repository": repository(org, repo),
            "sender": {"login": "alice"}
        }))
        .unwrap()
    }

    #[test]
    fn unknown_event_names_are_ignored() {
        let event = WebhookEvent::parse("star", b"{}").unwrap();
        assert!(matches!(event, WebhookEvent::Ignored { ref event } if event == "star"));
        assert!(event.repository().is_none());
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        assert!(WebhookEvent::parse("issues", b"{\"action\": 1}").is_err());
    }

    #[test]
    fn whole_org_monitoring() {
        let monitored = MonitoredRepos::from_specs(&[
            OrgSpec::new("istio"),
            OrgSpec::new("envoyproxy").with_repos(["envoy"]),
        ]);

        assert!(monitored.contains("istio", "anything"));
        assert!(monitored.contains("envoyproxy", "envoy"));
        assert!(!monitored.contains("envoyproxy", "data-plane-api"));
        assert!(!monitored.contains("kubernetes", "kubernetes"));
    }

    #[tokio::test]
    async fn issue_delivery_writes_issue_event_and_users() {
        let store = Arc::new(MemoryStore::new());
        let refresher = refresher(Arc::clone(&store), FakeGitHub::default(), &[OrgSpec::new("istio")]);

        let event = WebhookEvent::parse("issues", &issues_delivery("istio", "istio")).unwrap();
        let outcome = refresher.handle(event).await;

        assert_eq!(
            outcome,
            RefreshOutcome::Applied {
                org: "istio".to_string(),
                repo: "istio".to_string()
            }
        );
        let state = store.snapshot();
        assert!(state.issues.contains_key(&("istio".to_string(), "istio".to_string(), 17)));
        assert_eq!(state.issue_events.len(), 1);
        assert_eq!(state.issue_events[0].action, "opened");
        assert!(state.users.contains_key("alice"));
        assert!(state.bot_activities.is_empty());
    }

    #[tokio::test]
    async fn unmonitored_repo_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let refresher = refresher(
            Arc::clone(&store),
            FakeGitHub::default(),
            &[OrgSpec::new("istio").with_repos(["api"])],
        );

        let event = WebhookEvent::parse("issues", &issues_delivery("istio", "istio")).unwrap();
        let outcome = refresher.handle(event).await;

        assert!(matches!(outcome, RefreshOutcome::NotMonitored { .. }));
        assert!(store.snapshot().issues.is_empty());
    }

    #[tokio::test]
    async fn pull_request_delivery_fetches_files() {
        let store = Arc::new(MemoryStore::new());
        let github = FakeGitHub::default().with_files("istio", "istio", 5, &["go.mod", "pkg/a.go"]);
        let refresher = refresher(Arc::clone(&store), github, &[OrgSpec::new("istio")]);

        let body = serde_json::to_vec(&json!({
            "action": "synchronize",
            "number": 5,
            "pull_request": {
                "number": 5,
                "title": "Bump deps",
                "created_at": "2024-05-01T12:00:00Z",
                "updated_at": "2024-05-02T12:00:00Z",
                "state": "open",
                "user": {"login": "bob"}
            },
            "repository": repository("istio", "istio"),
            "sender": {"login": "bob"}
        }))
        .unwrap();

        let outcome = refresher
            .handle(WebhookEvent::parse("pull_request", &body).unwrap())
            .await;

        assert!(matches!(outcome, RefreshOutcome::Applied { .. }));
        let state = store.snapshot();
        let pr = &state.pull_requests[&("istio".to_string(), "istio".to_string(), 5)];
        assert_eq!(pr.files.0, ["go.mod", "pkg/a.go"]);
        assert_eq!(state.pull_request_events[0].actor, "bob");
    }

    #[tokio::test]
    async fn store_failure_is_reported_not_raised() {
        let store = Arc::new(MemoryStore::new());
        store.fail_operation("write_issues");
        let refresher = refresher(Arc::clone(&store), FakeGitHub::default(), &[OrgSpec::new("istio")]);

        let event = WebhookEvent::parse("issues", &issues_delivery("istio", "istio")).unwrap();
        let outcome = refresher.handle(event).await;

        assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
        assert!(store.snapshot().issue_events.is_empty());
    }

    #[tokio::test]
    async fn issue_comment_without_url_uses_payload_issue_number() {
        let store = Arc::new(MemoryStore::new());
        let refresher = refresher(Arc::clone(&store), FakeGitHub::default(), &[OrgSpec::new("istio")]);

        let body = serde_json::to_vec(&json!({
            "action": "created",
            "issue": {"number": 8},
            "comment": {
                "id": 99,
                "body": "/retest",
                "user": {"login": "carol"},
                "created_at": "2024-05-01T12:00:00Z",
                "updated_at": "2024-05-01T12:00:00Z"
            },
            "repository": repository("istio", "istio"),
            "sender": {"login": "carol"}
        }))
        .unwrap();

        let outcome = refresher
            .handle(WebhookEvent::parse("issue_comment", &body).unwrap())
            .await;

        assert!(matches!(outcome, RefreshOutcome::Applied { .. }));
        let state = store.snapshot();
        assert_eq!(state.issue_comment_events[0].issue_number, 8);
        assert_eq!(state.issue_comment_events[0].issue_comment_id, 99);
    }
}
