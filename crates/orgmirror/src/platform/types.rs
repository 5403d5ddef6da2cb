use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::github::types::{
    GhContent, GhEvent, GhIssue, GhIssueComment, GhIssueEvent, GhLabel, GhOrganization,
    GhPullRequest, GhPullRequestFile, GhRepoComment, GhRepository, GhReview, GhReviewComment,
    GhTree, GhUser,
};
use crate::zenhub::types::ZhIssueData;

use super::errors::Result;

/// Upstream page size for every listing call.
pub const PAGE_SIZE: u32 = 100;

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Page number to request next, `None` on the last page.
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }

    pub fn with_next(items: Vec<T>, next_page: u32) -> Self {
        Self {
            items,
            next_page: Some(next_page),
        }
    }
}

/// The GitHub operations the mirror consumes.
///
/// Implementations apply rate limiting and retry transparently: a call either
/// returns a typed payload or a terminal error. Missing resources are reported
/// as [`PlatformError::NotFound`](super::PlatformError::NotFound).
///
/// Listing methods take a 1-based `page` and report the next page, so callers
/// can persist each page before requesting the next one.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn get_org(&self, org: &str) -> Result<GhOrganization>;

    async fn list_org_repos(&self, org: &str, page: u32) -> Result<Page<GhRepository>>;

    async fn get_repo(&self, org: &str, repo: &str) -> Result<GhRepository>;

    /// Issues (of any state) updated at or after `since`.
    async fn list_issues(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhIssue>>;

    /// Issue comments across the repository updated at or after `since`.
    async fn list_issue_comments(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhIssueComment>>;

    async fn list_pull_requests(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhPullRequest>>;

    async fn list_reviews(
        &self,
        org: &str,
        repo: &str,
        number: i64,
        page: u32,
    ) -> Result<Page<GhReview>>;

    async fn list_pull_request_files(
        &self,
        org: &str,
        repo: &str,
        number: i64,
        page: u32,
    ) -> Result<Page<GhPullRequestFile>>;

    /// Review comments across the repository updated at or after `since`.
    async fn list_review_comments(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhReviewComment>>;

    async fn list_repo_comments(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhRepoComment>>;

    async fn list_repo_events(&self, org: &str, repo: &str, page: u32) -> Result<Page<GhEvent>>;

    async fn list_issue_events(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhIssueEvent>>;

    async fn list_labels(&self, org: &str, repo: &str, page: u32) -> Result<Page<GhLabel>>;

    async fn list_members(&self, org: &str, page: u32) -> Result<Page<GhUser>>;

    /// Full profile of one user.
    async fn get_user(&self, login: &str) -> Result<GhUser>;

    async fn get_contents(&self, org: &str, repo: &str, path: &str) -> Result<GhContent>;

    /// SHA of the tip commit of `branch`.
    async fn latest_commit_sha(&self, org: &str, repo: &str, branch: &str) -> Result<String>;

    async fn get_tree(&self, org: &str, repo: &str, sha: &str, recursive: bool) -> Result<GhTree>;

    /// Unauthenticated raw file fetch from the content host.
    async fn fetch_raw(&self, org: &str, repo: &str, branch: &str, path: &str) -> Result<String>;
}

/// The ZenHub operations the mirror consumes.
#[async_trait]
pub trait ZenHubApi: Send + Sync {
    /// Pipeline data for one issue; `NotFound` when ZenHub never tracked it.
    async fn get_issue_data(&self, repo_id: i64, issue_number: i64) -> Result<ZhIssueData>;
}
