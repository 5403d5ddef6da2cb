use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::github::types::{
    GhContent, GhEvent, GhIssue, GhIssueComment, GhIssueEvent, GhLabel, GhOrganization,
    GhPullRequest, GhPullRequestFile, GhRepoComment, GhRepository, GhReview, GhReviewComment,
    GhTree, GhUser,
};
use crate::zenhub::types::ZhIssueData;

use super::errors::Result;
use super::types::{GitHubApi, Page, ZenHubApi};

type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default request rates (requests per second).
pub mod rate_limits {
    /// GitHub: 5000 requests/hour for a token, 10/sec leaves room for bursts.
    pub const GITHUB_DEFAULT_RPS: u32 = 10;
    /// ZenHub: 100 requests/minute per token.
    pub const ZENHUB_DEFAULT_RPS: u32 = 1;
}

fn direct_limiter(requests_per_second: u32) -> Arc<GovernorRateLimiter> {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// A standalone rate limiter for calls that don't go through a client trait,
/// such as raw content fetches.
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// `requests_per_second` of 0 is treated as 1.
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            inner: direct_limiter(requests_per_second),
        }
    }

    /// Wait until a request is allowed.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

/// Proactive rate limiting in front of a [`GitHubApi`] or [`ZenHubApi`].
///
/// Every call waits on a shared `governor` limiter before delegating, so all
/// clones of one wrapper draw from the same budget.
///
/// ```ignore
/// let github = RateLimitedClient::new(GitHubClient::new(&token)?, rate_limits::GITHUB_DEFAULT_RPS);
/// let zenhub = RateLimitedClient::new(ZenHubClient::new(&zh_token)?, rate_limits::ZENHUB_DEFAULT_RPS);
/// ```
pub struct RateLimitedClient<C> {
    inner: C,
    limiter: ApiRateLimiter,
}

impl<C> RateLimitedClient<C> {
    pub fn new(inner: C, requests_per_second: u32) -> Self {
        Self {
            inner,
            limiter: ApiRateLimiter::new(requests_per_second),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn wait(&self) {
        self.limiter.wait().await;
    }
}

impl<C: Clone> Clone for RateLimitedClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

#[async_trait]
impl<C: GitHubApi> GitHubApi for RateLimitedClient<C> {
    async fn get_org(&self, org: &str) -> Result<GhOrganization> {
        self.wait().await;
        self.inner.get_org(org).await
    }

    async fn list_org_repos(&self, org: &str, page: u32) -> Result<Page<GhRepository>> {
        self.wait().await;
        self.inner.list_org_repos(org, page).await
    }

    async fn get_repo(&self, org: &str, repo: &str) -> Result<GhRepository> {
        self.wait().await;
        self.inner.get_repo(org, repo).await
    }

    async fn list_issues(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhIssue>> {
        self.wait().await;
        self.inner.list_issues(org, repo, since, page).await
    }

    async fn list_issue_comments(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhIssueComment>> {
        self.wait().await;
        self.inner.list_issue_comments(org, repo, since, page).await
    }

    async fn list_pull_requests(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhPullRequest>> {
        self.wait().await;
        self.inner.list_pull_requests(org, repo, page).await
    }

    async fn list_reviews(
        &self,
        org: &str,
        repo: &str,
        number: i64,
        page: u32,
    ) -> Result<Page<GhReview>> {
        self.wait().await;
        self.inner.list_reviews(org, repo, number, page).await
    }

    async fn list_pull_request_files(
        &self,
        org: &str,
        repo: &str,
        number: i64,
        page: u32,
    ) -> Result<Page<GhPullRequestFile>> {
        self.wait().await;
        self.inner
            .list_pull_request_files(org, repo, number, page)
            .await
    }

    async fn list_review_comments(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhReviewComment>> {
        self.wait().await;
        self.inner.list_review_comments(org, repo, since, page).await
    }

    async fn list_repo_comments(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhRepoComment>> {
        self.wait().await;
        self.inner.list_repo_comments(org, repo, page).await
    }

    async fn list_repo_events(&self, org: &str, repo: &str, page: u32) -> Result<Page<GhEvent>> {
        self.wait().await;
        self.inner.list_repo_events(org, repo, page).await
    }

    async fn list_issue_events(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhIssueEvent>> {
        self.wait().await;
        self.inner.list_issue_events(org, repo, page).await
    }

    async fn list_labels(&self, org: &str, repo: &str, page: u32) -> Result<Page<GhLabel>> {
        self.wait().await;
        self.inner.list_labels(org, repo, page).await
    }

    async fn list_members(&self, org: &str, page: u32) -> Result<Page<GhUser>> {
        self.wait().await;
        self.inner.list_members(org, page).await
    }

    async fn get_user(&self, login: &str) -> Result<GhUser> {
        self.wait().await;
        self.inner.get_user(login).await
    }

    async fn get_contents(&self, org: &str, repo: &str, path: &str) -> Result<GhContent> {
        self.wait().await;
        self.inner.get_contents(org, repo, path).await
    }

    async fn latest_commit_sha(&self, org: &str, repo: &str, branch: &str) -> Result<String> {
        self.wait().await;
        self.inner.latest_commit_sha(org, repo, branch).await
    }

    async fn get_tree(&self, org: &str, repo: &str, sha: &str, recursive: bool) -> Result<GhTree> {
        self.wait().await;
        self.inner.get_tree(org, repo, sha, recursive).await
    }

    async fn fetch_raw(&self, org: &str, repo: &str, branch: &str, path: &str) -> Result<String> {
        self.wait().await;
        self.inner.fetch_raw(org, repo, branch, path).await
    }
}

#[async_trait]
impl<C: ZenHubApi> ZenHubApi for RateLimitedClient<C> {
    async fn get_issue_data(&self, repo_id: i64, issue_number: i64) -> Result<ZhIssueData> {
        self.wait().await;
        self.inner.get_issue_data(repo_id, issue_number).await
    }
}
