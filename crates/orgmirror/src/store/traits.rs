use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::Result;
use crate::entity::bot_activity::Bookmark;
use crate::entity::{
    bot_activity, issue, issue_comment, issue_comment_event, issue_event, issue_pipeline, label,
    maintainer, member, organization, pull_request, pull_request_event, pull_request_review,
    pull_request_review_comment, pull_request_review_comment_event, pull_request_review_event,
    repo_comment, repo_comment_event, repository, user,
};

/// The durable mirror.
///
/// Batch writes are idempotent upserts keyed by each entity's natural key;
/// event writes are insert-or-ignore. The `write_all_*`, `write_orgs` and
/// `write_repos` operations replace their whole collection (or the whole
/// organization slice of it). Empty batches are no-ops except for the
/// wholesale replacements, where an empty set clears the collection.
#[async_trait]
pub trait Store: Send + Sync {
    async fn write_orgs(&self, orgs: Vec<organization::Model>) -> Result<()>;
    async fn write_repos(&self, repos: Vec<repository::Model>) -> Result<()>;
    async fn write_all_members(&self, org: &str, members: Vec<member::Model>) -> Result<()>;
    async fn write_all_maintainers(
        &self,
        org: &str,
        maintainers: Vec<maintainer::Model>,
    ) -> Result<()>;

    async fn write_users(&self, users: Vec<user::Model>) -> Result<()>;
    async fn write_labels(&self, labels: Vec<label::Model>) -> Result<()>;
    async fn write_issues(&self, issues: Vec<issue::Model>) -> Result<()>;
    async fn write_issue_comments(&self, comments: Vec<issue_comment::Model>) -> Result<()>;
    async fn write_issue_pipelines(&self, pipelines: Vec<issue_pipeline::Model>) -> Result<()>;
    async fn write_pull_requests(&self, prs: Vec<pull_request::Model>) -> Result<()>;
    async fn write_pull_request_reviews(
        &self,
        reviews: Vec<pull_request_review::Model>,
    ) -> Result<()>;
    async fn write_pull_request_review_comments(
        &self,
        comments: Vec<pull_request_review_comment::Model>,
    ) -> Result<()>;
    async fn write_repo_comments(&self, comments: Vec<repo_comment::Model>) -> Result<()>;

    async fn write_issue_events(&self, events: Vec<issue_event::Model>) -> Result<()>;
    async fn write_issue_comment_events(
        &self,
        events: Vec<issue_comment_event::Model>,
    ) -> Result<()>;
    async fn write_pull_request_events(&self, events: Vec<pull_request_event::Model>)
    -> Result<()>;
    async fn write_pull_request_review_comment_events(
        &self,
        events: Vec<pull_request_review_comment_event::Model>,
    ) -> Result<()>;
    async fn write_pull_request_review_events(
        &self,
        events: Vec<pull_request_review_event::Model>,
    ) -> Result<()>;
    async fn write_repo_comment_events(&self, events: Vec<repo_comment_event::Model>)
    -> Result<()>;

    async fn read_bot_activity(&self, org: &str, repo: &str)
    -> Result<Option<bot_activity::Model>>;

    /// Move one bookmark from `guard` to `new`, only if it still equals `guard`.
    ///
    /// Creates the activity row when none exists. Returns whether the
    /// bookmark moved; a `false` means another writer got there first.
    async fn advance_bookmark(
        &self,
        org: &str,
        repo: &str,
        bookmark: Bookmark,
        guard: Option<DateTime<Utc>>,
        new: DateTime<Utc>,
    ) -> Result<bool>;

    /// Issues of one repository, ordered by number.
    async fn query_issues_by_repo(&self, org: &str, repo: &str) -> Result<Vec<issue::Model>>;

    async fn read_user(&self, login: &str) -> Result<Option<user::Model>>;
    async fn read_label(&self, org: &str, repo: &str, name: &str)
    -> Result<Option<label::Model>>;
    async fn read_pull_request(
        &self,
        org: &str,
        repo: &str,
        number: i64,
    ) -> Result<Option<pull_request::Model>>;
}
