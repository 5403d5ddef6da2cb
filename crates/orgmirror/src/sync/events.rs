//! Normalization of repository event feeds.
//!
//! The feed mixes many payload shapes under a `type` discriminator. Each
//! recognized discriminator maps to one [`RepoEventKind`] with one
//! normalization function; anything else is [`RepoEventKind::Unknown`] and is
//! dropped without error.

use serde::de::DeserializeOwned;

use crate::entity::{
    issue_comment_event, issue_event, pull_request_event, pull_request_review_comment_event,
    pull_request_review_event, repo_comment_event,
};
use crate::github::types::{
    CommitCommentActivity, GhEvent, GhIssueEvent, GhUser, IssueActivity, IssueCommentActivity,
    PullRequestActivity, ReviewActivity, ReviewCommentActivity,
};
use crate::store::{Result as StoreResult, Store};

/// The event shapes the mirror records.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RepoEventKind {
    Issue,
    IssueComment,
    PullRequest,
    PullRequestReviewComment,
    PullRequestReview,
    CommitComment,
    Unknown,
}

/// Wire discriminators, including legacy spellings.
const EVENT_KINDS: &[(&str, RepoEventKind)] = &[
    ("IssuesEvent", RepoEventKind::Issue),
    ("IssueEvent", RepoEventKind::Issue),
    ("IssueCommentEvent", RepoEventKind::IssueComment),
    ("PullRequestEvent", RepoEventKind::PullRequest),
    (
        "PullRequestReviewCommentEvent",
        RepoEventKind::PullRequestReviewComment,
    ),
    (
        "PullRequestCommentEvent",
        RepoEventKind::PullRequestReviewComment,
    ),
    ("PullRequestReviewEvent", RepoEventKind::PullRequestReview),
    ("CommitCommentEvent", RepoEventKind::CommitComment),
];

impl RepoEventKind {
    pub fn from_type(kind: &str) -> Self {
        EVENT_KINDS
            .iter()
            .find(|(name, _)| *name == kind)
            .map(|(_, k)| *k)
            .unwrap_or(Self::Unknown)
    }
}

fn actor_login(actor: Option<&GhUser>) -> String {
    actor.map(|a| a.login.clone()).unwrap_or_default()
}

fn payload<T: DeserializeOwned>(event: &GhEvent) -> Result<T, serde_json::Error> {
    serde_json::from_value(event.payload.clone())
}

/// Normalized records of one page of events, grouped by table.
#[derive(Debug, Default)]
pub struct EventBatch {
    pub issue_events: Vec<issue_event::Model>,
    pub issue_comment_events: Vec<issue_comment_event::Model>,
    pub pull_request_events: Vec<pull_request_event::Model>,
    pub pull_request_review_comment_events: Vec<pull_request_review_comment_event::Model>,
    pub pull_request_review_events: Vec<pull_request_review_event::Model>,
    pub repo_comment_events: Vec<repo_comment_event::Model>,
}

impl EventBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all tables.
    pub fn len(&self) -> usize {
        self.issue_events.len()
            + self.issue_comment_events.len()
            + self.pull_request_events.len()
            + self.pull_request_review_comment_events.len()
            + self.pull_request_review_events.len()
            + self.repo_comment_events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize one feed entry. Returns the kind it was dispatched to; a
    /// payload that does not match its kind's shape is an error and adds
    /// nothing.
    pub fn push(
        &mut self,
        org: &str,
        repo: &str,
        event: &GhEvent,
    ) -> Result<RepoEventKind, serde_json::Error> {
        let kind = RepoEventKind::from_type(event.kind.as_deref().unwrap_or_default());
        let actor = actor_login(event.actor.as_ref());
        let created_at = event.created_at;

        match kind {
            RepoEventKind::Issue => {
                let p: IssueActivity = payload(event)?;
                self.issue_events.push(issue_event::Model {
                    org_login: org.to_string(),
                    repo_name: repo.to_string(),
                    issue_number: p.issue.number,
                    created_at,
                    actor,
                    action: p.action.or(p.event).unwrap_or_default(),
                });
            }
            RepoEventKind::IssueComment => {
                let p: IssueCommentActivity = payload(event)?;
                self.issue_comment_events.push(issue_comment_event::Model {
                    org_login: org.to_string(),
                    repo_name: repo.to_string(),
                    issue_number: p.issue.number,
                    issue_comment_id: p.comment.id,
                    created_at,
                    actor,
                    action: p.action.unwrap_or_default(),
                });
            }
            RepoEventKind::PullRequest => {
                let p: PullRequestActivity = payload(event)?;
                self.pull_request_events.push(pull_request_event::Model {
                    org_login: org.to_string(),
                    repo_name: repo.to_string(),
                    pull_request_number: p.pull_request.number,
                    created_at,
                    actor,
                    action: p.action.unwrap_or_default(),
                });
            }
            RepoEventKind::PullRequestReviewComment => {
                let p: ReviewCommentActivity = payload(event)?;
                self.pull_request_review_comment_events
                    .push(pull_request_review_comment_event::Model {
                        org_login: org.to_string(),
                        repo_name: repo.to_string(),
                        pull_request_number: p.pull_request.number,
                        pull_request_review_comment_id: p.comment.id,
                        created_at,
                        actor,
                        action: p.action.unwrap_or_default(),
                    });
            }
            RepoEventKind::PullRequestReview => {
                let p: ReviewActivity = payload(event)?;
                self.pull_request_review_events
                    .push(pull_request_review_event::Model {
                        org_login: org.to_string(),
                        repo_name: repo.to_string(),
                        pull_request_number: p.pull_request.number,
                        pull_request_review_id: p.review.id,
                        created_at,
                        actor,
                        action: p.action.unwrap_or_default(),
                    });
            }
            RepoEventKind::CommitComment => {
                let p: CommitCommentActivity = payload(event)?;
                self.repo_comment_events.push(repo_comment_event::Model {
                    org_login: org.to_string(),
                    repo_name: repo.to_string(),
                    repo_comment_id: p.comment.id,
                    created_at,
                    actor,
                    action: p.action.unwrap_or_else(|| "created".to_string()),
                });
            }
            RepoEventKind::Unknown => {}
        }

        Ok(kind)
    }

    /// Write every non-empty group.
    pub async fn write(self, store: &dyn Store) -> StoreResult<()> {
        if !self.issue_events.is_empty() {
            store.write_issue_events(self.issue_events).await?;
        }
        if !self.issue_comment_events.is_empty() {
            store
                .write_issue_comment_events(self.issue_comment_events)
                .await?;
        }
        if !self.pull_request_events.is_empty() {
            store
                .write_pull_request_events(self.pull_request_events)
                .await?;
        }
        if !self.pull_request_review_comment_events.is_empty() {
            store
                .write_pull_request_review_comment_events(self.pull_request_review_comment_events)
                .await?;
        }
        if !self.pull_request_review_events.is_empty() {
            store
                .write_pull_request_review_events(self.pull_request_review_events)
                .await?;
        }
        if !self.repo_comment_events.is_empty() {
            store
                .write_repo_comment_events(self.repo_comment_events)
                .await?;
        }
        Ok(())
    }
}

/// An issue timeline entry as an issue event.
pub fn convert_issue_timeline_event(
    org: &str,
    repo: &str,
    event: &GhIssueEvent,
) -> issue_event::Model {
    issue_event::Model {
        org_login: org.to_string(),
        repo_name: repo.to_string(),
        issue_number: event.issue.as_ref().map(|i| i.number).unwrap_or_default(),
        created_at: event.created_at,
        actor: actor_login(event.actor.as_ref()),
        action: event.event.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn event(kind: &str, payload: serde_json::Value) -> GhEvent {
        serde_json::from_value(json!({
            "id": "1",
            "type": kind,
            "actor": {"login": "alice"},
            "created_at": "2024-05-01T12:00:00Z",
            "payload": payload,
        }))
        .unwrap()
    }

    #[test]
    fn lookup_covers_legacy_names() {
        assert_eq!(RepoEventKind::from_type("IssueEvent"), RepoEventKind::Issue);
        assert_eq!(RepoEventKind::from_type("IssuesEvent"), RepoEventKind::Issue);
        assert_eq!(
            RepoEventKind::from_type("PullRequestCommentEvent"),
            RepoEventKind::PullRequestReviewComment
        );
        assert_eq!(RepoEventKind::from_type("WatchEvent"), RepoEventKind::Unknown);
        assert_eq!(RepoEventKind::from_type(""), RepoEventKind::Unknown);
    }

    #[test]
    fn issue_event_and_unknown_type() {
        let mut batch = EventBatch::new();

        let first = batch
            .push(
                "istio",
                "istio",
                &event("IssueEvent", json!({"event": "closed", "issue": {"number": 4}})),
            )
            .unwrap();
        let second = batch
            .push("istio", "istio", &event("ForkEvent", json!({"forkee": {}})))
            .unwrap();

        assert_eq!(first, RepoEventKind::Issue);
        assert_eq!(second, RepoEventKind::Unknown);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.issue_events[0].issue_number, 4);
        assert_eq!(batch.issue_events[0].action, "closed");
        assert_eq!(batch.issue_events[0].actor, "alice");
    }

    #[test]
    fn malformed_payload_adds_nothing() {
        let mut batch = EventBatch::new();
        let result = batch.push(
            "istio",
            "istio",
            &event("PullRequestReviewEvent", json!({"action": "submitted"})),
        );

        assert!(result.is_err());
        assert!(batch.is_empty());
    }

    #[test]
    fn every_kind_lands_in_its_own_table() {
        let mut batch = EventBatch::new();
        let entries = [
            event("IssuesEvent", json!({"action": "opened", "issue": {"number": 1}})),
            event(
                "IssueCommentEvent",
                json!({"action": "created", "issue": {"number": 1}, "comment": {"id": 10}}),
            ),
            event(
                "PullRequestEvent",
                json!({"action": "opened", "pull_request": {"number": 2}}),
            ),
            event(
                "PullRequestReviewCommentEvent",
                json!({"action": "created", "pull_request": {"number": 2}, "comment": {"id": 20}}),
            ),
            event(
                "PullRequestReviewEvent",
                json!({"action": "submitted", "pull_request": {"number": 2}, "review": {"id": 30}}),
            ),
            event("CommitCommentEvent", json!({"comment": {"id": 40}})),
        ];
        for entry in &entries {
            batch.push("istio", "api", entry).unwrap();
        }

        assert_eq!(batch.issue_comment_events[0].issue_comment_id, 10);
        assert_eq!(
            batch.pull_request_review_comment_events[0].pull_request_review_comment_id,
            20
        );
        assert_eq!(batch.pull_request_review_events[0].pull_request_review_id, 30);
        assert_eq!(batch.repo_comment_events[0].action, "created");
        assert_eq!(batch.len(), 6);
    }

    #[tokio::test]
    async fn write_skips_empty_groups() {
        let store = MemoryStore::new();
        store.fail_operation("write_pull_request_events");

        let mut batch = EventBatch::new();
        batch
            .push(
                "istio",
                "istio",
                &event("IssuesEvent", json!({"action": "opened", "issue": {"number": 9}})),
            )
            .unwrap();
        batch.write(&store).await.unwrap();

        assert_eq!(store.snapshot().issue_events.len(), 1);
    }

    #[test]
    fn timeline_event_without_issue_uses_zero() {
        let timeline: GhIssueEvent = serde_json::from_value(json!({
            "id": 5,
            "event": "labeled",
            "created_at": "2024-05-01T12:00:00Z",
        }))
        .unwrap();

        let model = convert_issue_timeline_event("istio", "istio", &timeline);
        assert_eq!(model.issue_number, 0);
        assert_eq!(model.actor, "");
        assert_eq!(model.action, "labeled");
    }
}
