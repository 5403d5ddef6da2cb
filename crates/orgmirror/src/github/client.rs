//! GitHub API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use octocrab::Octocrab;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::types::{
    GhCommit, GhContent, GhEvent, GhIssue, GhIssueComment, GhIssueEvent, GhLabel, GhOrganization,
    GhPullRequest, GhPullRequestFile, GhRepoComment, GhRepository, GhReview, GhReviewComment,
    GhTree, GhUser,
};
use crate::platform::{GitHubApi, PAGE_SIZE, Page, PlatformError, Result};
use crate::retry::{RetryConfig, with_retry_config};

/// Public GitHub REST API host.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Host serving raw repository content.
pub const GITHUB_RAW_URL: &str = "https://raw.githubusercontent.com";

const USER_AGENT: &str = concat!("orgmirror/", env!("CARGO_PKG_VERSION"));

/// Pagination information extracted from GitHub's Link header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPagination {
    /// The last page number (from rel="last" link).
    pub last_page: Option<u32>,
    /// The next page number (from rel="next" link).
    pub next_page: Option<u32>,
}

/// Parse the Link header to extract pagination info.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/repositories/123/issues?per_page=100&page=2>; rel="next", <...&page=3>; rel="last"`
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    let mut info = LinkPagination::default();

    for part in link_header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.trim().split(';') {
            let segment = segment.trim();
            if let Some(inner) = segment
                .strip_prefix('<')
                .and_then(|s| s.strip_suffix('>'))
            {
                url = Some(inner);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        if let (Some(url), Some(rel)) = (url, rel)
            && let Some(page) = extract_page_from_url(url)
        {
            match rel {
                "last" => info.last_page = Some(page),
                "next" => info.next_page = Some(page),
                _ => {}
            }
        }
    }

    info
}

fn extract_page_from_url(url: &str) -> Option<u32> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

/// When the response says the quota is spent, the instant it resets.
fn quota_exhausted_until(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if header("x-ratelimit-remaining") == Some("0") {
        let reset = header("x-ratelimit-reset")
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0));
        return Some(reset.unwrap_or_else(Utc::now));
    }

    header("retry-after")
        .and_then(|v| v.parse::<i64>().ok())
        .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
}

fn from_octocrab(err: octocrab::Error, resource: &str) -> PlatformError {
    match err {
        octocrab::Error::GitHub { source, .. } => match source.status_code.as_u16() {
            404 => PlatformError::not_found(resource),
            429 => PlatformError::RateLimited {
                reset_at: Utc::now(),
            },
            403 if source.message.to_ascii_lowercase().contains("rate limit") => {
                PlatformError::RateLimited {
                    reset_at: Utc::now(),
                }
            }
            401 | 403 => PlatformError::AuthRequired,
            _ => PlatformError::api(format!("{resource}: {}", source.message)),
        },
        octocrab::Error::Serde { source, .. } => {
            PlatformError::decode(format!("{resource}: {source}"))
        }
        octocrab::Error::Json { source, .. } => {
            PlatformError::decode(format!("{resource}: {source}"))
        }
        other => PlatformError::network(format!("{resource}: {other}")),
    }
}

fn format_since(since: DateTime<Utc>) -> String {
    since.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// GitHub REST client.
///
/// Single objects are fetched through octocrab; paged listings and raw
/// content go through reqwest so the Link and rate-limit headers are visible.
/// Rate-limit responses are retried with backoff inside every call.
#[derive(Clone)]
pub struct GitHubClient {
    inner: Arc<Octocrab>,
    http_client: reqwest::Client,
    token: Arc<String>,
    api_base: String,
    raw_base: String,
    retry: RetryConfig,
}

impl GitHubClient {
    /// Create a client for api.github.com.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_urls(token, GITHUB_API_URL, GITHUB_RAW_URL)
    }

    /// Create a client against other hosts, e.g. GitHub Enterprise or a local fake.
    pub fn with_base_urls(token: &str, api_base: &str, raw_base: &str) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/').to_string();

        let mut builder = Octocrab::builder()
            .base_uri(api_base.as_str())
            .map_err(|e| PlatformError::internal(format!("invalid API base {api_base}: {e}")))?;
        if !token.is_empty() {
            builder = builder.personal_token(token.to_string());
        }
        let octocrab = builder
            .build()
            .map_err(|e| PlatformError::internal(format!("octocrab: {e}")))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PlatformError::internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(octocrab),
            http_client,
            token: Arc::new(token.to_string()),
            api_base,
            raw_base: raw_base.trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Get a reference to the underlying Octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.inner
    }

    async fn get_object<T, P>(&self, route: &str, params: Option<&P>) -> Result<T>
    where
        T: DeserializeOwned + Send,
        P: Serialize + ?Sized + Sync,
    {
        with_retry_config(
            self.retry.clone(),
            || async move {
                self.inner
                    .get::<T, _, P>(route, params)
                    .await
                    .map_err(|e| from_octocrab(e, route))
            },
            PlatformError::is_rate_limited,
            route,
        )
        .await
    }

    fn page_url(&self, route: &str, query: &[(&str, String)], page: u32) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{route}", self.api_base))
            .map_err(|e| PlatformError::internal(format!("{route}: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("per_page", &PAGE_SIZE.to_string());
            pairs.append_pair("page", &page.to_string());
        }
        Ok(url)
    }

    async fn fetch_page<T: DeserializeOwned + Send>(&self, url: &Url, route: &str) -> Result<Page<T>> {
        let mut request = self
            .http_client
            .get(url.clone())
            .header("Accept", "application/vnd.github+json");
        if !self.token.is_empty() {
            request = request.header(AUTHORIZATION, format!("Bearer {}", self.token));
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let exhausted_until = quota_exhausted_until(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::from_status(
                status,
                route,
                exhausted_until,
                &body,
            ));
        }

        let next_page = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(|h| parse_link_header(h).next_page);

        let items: Vec<T> = response.json().await?;
        Ok(Page { items, next_page })
    }

    async fn get_page<T: DeserializeOwned + Send>(
        &self,
        route: &str,
        query: &[(&str, String)],
        page: u32,
    ) -> Result<Page<T>> {
        let url = self.page_url(route, query, page)?;
        with_retry_config(
            self.retry.clone(),
            || self.fetch_page(&url, route),
            PlatformError::is_rate_limited,
            route,
        )
        .await
    }

    async fn fetch_raw_once(&self, url: &str, resource: &str) -> Result<String> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let exhausted_until = quota_exhausted_until(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::from_status(
                status,
                resource,
                exhausted_until,
                &body,
            ));
        }
        Ok(response.text().await?)
    }
}

fn since_query(since: Option<DateTime<Utc>>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("sort", "updated".to_string()),
        ("direction", "asc".to_string()),
    ];
    if let Some(since) = since {
        query.push(("since", format_since(since)));
    }
    query
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn get_org(&self, org: &str) -> Result<GhOrganization> {
        self.get_object(&format!("/orgs/{org}"), None::<&()>).await
    }

    async fn list_org_repos(&self, org: &str, page: u32) -> Result<Page<GhRepository>> {
        self.get_page(
            &format!("/orgs/{org}/repos"),
            &[("type", "all".to_string())],
            page,
        )
        .await
    }

    async fn get_repo(&self, org: &str, repo: &str) -> Result<GhRepository> {
        self.get_object(&format!("/repos/{org}/{repo}"), None::<&()>)
            .await
    }

    async fn list_issues(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhIssue>> {
        let mut query = since_query(since);
        query.push(("state", "all".to_string()));
        self.get_page(&format!("/repos/{org}/{repo}/issues"), &query, page)
            .await
    }

    async fn list_issue_comments(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhIssueComment>> {
        self.get_page(
            &format!("/repos/{org}/{repo}/issues/comments"),
            &since_query(since),
            page,
        )
        .await
    }

    async fn list_pull_requests(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhPullRequest>> {
        self.get_page(
            &format!("/repos/{org}/{repo}/pulls"),
            &[("state", "all".to_string())],
            page,
        )
        .await
    }

    async fn list_reviews(
        &self,
        org: &str,
        repo: &str,
        number: i64,
        page: u32,
    ) -> Result<Page<GhReview>> {
        self.get_page(&format!("/repos/{org}/{repo}/pulls/{number}/reviews"), &[], page)
            .await
    }

    async fn list_pull_request_files(
        &self,
        org: &str,
        repo: &str,
        number: i64,
        page: u32,
    ) -> Result<Page<GhPullRequestFile>> {
        self.get_page(&format!("/repos/{org}/{repo}/pulls/{number}/files"), &[], page)
            .await
    }

    async fn list_review_comments(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhReviewComment>> {
        self.get_page(
            &format!("/repos/{org}/{repo}/pulls/comments"),
            &since_query(since),
            page,
        )
        .await
    }

    async fn list_repo_comments(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhRepoComment>> {
        self.get_page(&format!("/repos/{org}/{repo}/comments"), &[], page)
            .await
    }

    async fn list_repo_events(&self, org: &str, repo: &str, page: u32) -> Result<Page<GhEvent>> {
        self.get_page(&format!("/repos/{org}/{repo}/events"), &[], page)
            .await
    }

    async fn list_issue_events(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhIssueEvent>> {
        self.get_page(&format!("/repos/{org}/{repo}/issues/events"), &[], page)
            .await
    }

    async fn list_labels(&self, org: &str, repo: &str, page: u32) -> Result<Page<GhLabel>> {
        self.get_page(&format!("/repos/{org}/{repo}/labels"), &[], page)
            .await
    }

    async fn list_members(&self, org: &str, page: u32) -> Result<Page<GhUser>> {
        self.get_page(&format!("/orgs/{org}/members"), &[], page)
            .await
    }

    async fn get_user(&self, login: &str) -> Result<GhUser> {
        self.get_object(&format!("/users/{login}"), None::<&()>)
            .await
    }

    async fn get_contents(&self, org: &str, repo: &str, path: &str) -> Result<GhContent> {
        self.get_object(&format!("/repos/{org}/{repo}/contents/{path}"), None::<&()>)
            .await
    }

    async fn latest_commit_sha(&self, org: &str, repo: &str, branch: &str) -> Result<String> {
        let commit: GhCommit = self
            .get_object(&format!("/repos/{org}/{repo}/commits/{branch}"), None::<&()>)
            .await?;
        Ok(commit.sha)
    }

    async fn get_tree(&self, org: &str, repo: &str, sha: &str, recursive: bool) -> Result<GhTree> {
        let route = format!("/repos/{org}/{repo}/git/trees/{sha}");
        if recursive {
            self.get_object(&route, Some(&[("recursive", "1")])).await
        } else {
            self.get_object(&route, None::<&()>).await
        }
    }

    async fn fetch_raw(&self, org: &str, repo: &str, branch: &str, path: &str) -> Result<String> {
        let resource = format!("{org}/{repo}/{branch}/{path}");
        let url = format!("{}/{resource}", self.raw_base);
        with_retry_config(
            self.retry.clone(),
            || self.fetch_raw_once(&url, &resource),
            PlatformError::is_rate_limited,
            &resource,
        )
        .await
    }
}
