//! In-memory upstreams for unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::github::types::{
    GhContent, GhEvent, GhIssue, GhIssueComment, GhIssueEvent, GhLabel, GhNumberRef, GhOrganization,
    GhPullRequest, GhPullRequestFile, GhRepoComment, GhRepository, GhReview, GhReviewComment,
    GhTree, GhTreeEntry, GhUser,
};
use crate::platform::{GitHubApi, Page, PlatformError, Result, ZenHubApi};
use crate::zenhub::types::{ZhIssueData, ZhPipeline};

type RepoKey = (String, String);
type NumberKey = (String, String, i64);
type PathKey = (String, String, String);

fn key(org: &str, repo: &str) -> RepoKey {
    (org.to_string(), repo.to_string())
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn gh_user(login: &str) -> GhUser {
    GhUser {
        login: login.to_string(),
        ..Default::default()
    }
}

pub fn gh_issue(number: i64, author: &str, updated_at: &str) -> GhIssue {
    GhIssue {
        number,
        title: format!("issue {number}"),
        body: None,
        labels: Vec::new(),
        created_at: at(updated_at),
        updated_at: at(updated_at),
        closed_at: None,
        state: "open".to_string(),
        user: Some(gh_user(author)),
        assignees: Vec::new(),
    }
}

pub fn gh_pull_request(number: i64, author: &str, updated_at: &str) -> GhPullRequest {
    GhPullRequest {
        number,
        title: format!("pr {number}"),
        body: None,
        labels: Vec::new(),
        created_at: at(updated_at),
        updated_at: at(updated_at),
        closed_at: None,
        merged_at: None,
        state: "open".to_string(),
        user: Some(gh_user(author)),
        assignees: Vec::new(),
        requested_reviewers: Vec::new(),
        base: Default::default(),
        head: Default::default(),
    }
}

pub fn gh_review(id: i64, author: &str) -> GhReview {
    GhReview {
        id,
        body: None,
        user: Some(gh_user(author)),
        submitted_at: None,
        state: "APPROVED".to_string(),
    }
}

pub fn gh_issue_comment(org: &str, repo: &str, number: i64, id: i64, author: &str) -> GhIssueComment {
    GhIssueComment {
        id,
        body: Some("lgtm".to_string()),
        user: Some(gh_user(author)),
        created_at: at("2024-05-01T12:00:00Z"),
        updated_at: at("2024-05-01T12:00:00Z"),
        issue_url: format!("https://api.github.com/repos/{org}/{repo}/issues/{number}"),
    }
}

pub fn gh_review_comment(org: &str, repo: &str, number: i64, id: i64, author: &str) -> GhReviewComment {
    GhReviewComment {
        id,
        body: Some("nit".to_string()),
        user: Some(gh_user(author)),
        created_at: at("2024-05-01T12:00:00Z"),
        updated_at: at("2024-05-01T12:00:00Z"),
        pull_request_url: format!("https://api.github.com/repos/{org}/{repo}/pulls/{number}"),
    }
}

pub fn gh_repo_comment(id: i64, author: &str, commit: &str) -> GhRepoComment {
    GhRepoComment {
        id,
        body: Some("ship it".to_string()),
        user: Some(gh_user(author)),
        created_at: at("2024-05-01T12:00:00Z"),
        updated_at: at("2024-05-01T12:00:00Z"),
        commit_id: commit.to_string(),
    }
}

pub fn gh_issue_event(id: i64, number: i64, event: &str, actor: &str) -> GhIssueEvent {
    GhIssueEvent {
        id,
        actor: Some(gh_user(actor)),
        event: event.to_string(),
        created_at: at("2024-05-03T09:00:00Z"),
        issue: Some(GhNumberRef { number }),
    }
}

pub fn gh_event(kind: &str, payload: serde_json::Value) -> GhEvent {
    GhEvent {
        id: "1".to_string(),
        kind: Some(kind.to_string()),
        actor: Some(gh_user("actor")),
        created_at: at("2024-05-01T12:00:00Z"),
        payload,
    }
}

fn paged<T: Clone>(items: &[T], page: u32, size: usize) -> Page<T> {
    if size == 0 {
        return Page::last(items.to_vec());
    }
    let start = (page.saturating_sub(1) as usize) * size;
    let chunk: Vec<T> = items.iter().skip(start).take(size).cloned().collect();
    if start + size < items.len() {
        Page::with_next(chunk, page + 1)
    } else {
        Page::last(chunk)
    }
}

/// A scripted [`GitHubApi`].
///
/// Anything not configured is reported as `NotFound`. Every call is logged
/// by method name so tests can assert on what was fetched.
#[derive(Default)]
pub struct FakeGitHub {
    orgs: HashMap<String, GhOrganization>,
    repos: BTreeMap<RepoKey, GhRepository>,
    issues: HashMap<RepoKey, Vec<GhIssue>>,
    issue_comments: HashMap<RepoKey, Vec<GhIssueComment>>,
    pull_requests: HashMap<RepoKey, Vec<GhPullRequest>>,
    reviews: HashMap<NumberKey, Vec<GhReview>>,
    files: HashMap<NumberKey, Vec<GhPullRequestFile>>,
    review_comments: HashMap<RepoKey, Vec<GhReviewComment>>,
    repo_comments: HashMap<RepoKey, Vec<GhRepoComment>>,
    events: HashMap<RepoKey, Vec<GhEvent>>,
    issue_events: HashMap<RepoKey, Vec<GhIssueEvent>>,
    labels: HashMap<RepoKey, Vec<GhLabel>>,
    members: HashMap<String, Vec<GhUser>>,
    users: HashMap<String, GhUser>,
    contents: HashMap<PathKey, GhContent>,
    trees: HashMap<RepoKey, GhTree>,
    raw: HashMap<PathKey, String>,
    failing: HashSet<&'static str>,
    page_size: usize,
    calls: Mutex<Vec<String>>,
}

impl FakeGitHub {
    pub fn with_org(mut self, login: &str) -> Self {
        self.orgs.insert(
            login.to_string(),
            GhOrganization {
                login: login.to_string(),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_repo(mut self, org: &str, name: &str, id: i64) -> Self {
        self.repos.insert(
            key(org, name),
            GhRepository {
                id,
                name: name.to_string(),
                owner: gh_user(org),
                default_branch: Some("master".to_string()),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_issue(mut self, org: &str, repo: &str, issue: GhIssue) -> Self {
        self.issues.entry(key(org, repo)).or_default().push(issue);
        self
    }

    pub fn with_issue_comment(mut self, org: &str, repo: &str, comment: GhIssueComment) -> Self {
        self.issue_comments
            .entry(key(org, repo))
            .or_default()
            .push(comment);
        self
    }

    pub fn with_pull_request(mut self, org: &str, repo: &str, pr: GhPullRequest) -> Self {
        self.pull_requests.entry(key(org, repo)).or_default().push(pr);
        self
    }

    pub fn with_review(mut self, org: &str, repo: &str, number: i64, review: GhReview) -> Self {
        self.reviews
            .entry((org.to_string(), repo.to_string(), number))
            .or_default()
            .push(review);
        self
    }

    pub fn with_files(mut self, org: &str, repo: &str, number: i64, files: &[&str]) -> Self {
        self.files.insert(
            (org.to_string(), repo.to_string(), number),
            files
                .iter()
                .map(|f| GhPullRequestFile {
                    filename: f.to_string(),
                })
                .collect(),
        );
        self
    }

    pub fn with_review_comment(mut self, org: &str, repo: &str, comment: GhReviewComment) -> Self {
        self.review_comments
            .entry(key(org, repo))
            .or_default()
            .push(comment);
        self
    }

    pub fn with_repo_comment(mut self, org: &str, repo: &str, comment: GhRepoComment) -> Self {
        self.repo_comments
            .entry(key(org, repo))
            .or_default()
            .push(comment);
        self
    }

    pub fn with_event(mut self, org: &str, repo: &str, event: GhEvent) -> Self {
        self.events.entry(key(org, repo)).or_default().push(event);
        self
    }

    pub fn with_issue_event(mut self, org: &str, repo: &str, event: GhIssueEvent) -> Self {
        self.issue_events
            .entry(key(org, repo))
            .or_default()
            .push(event);
        self
    }

    pub fn with_label(mut self, org: &str, repo: &str, name: &str) -> Self {
        self.labels.entry(key(org, repo)).or_default().push(GhLabel {
            name: name.to_string(),
            description: None,
            color: "ededed".to_string(),
        });
        self
    }

    pub fn with_member(mut self, org: &str, login: &str) -> Self {
        self.members
            .entry(org.to_string())
            .or_default()
            .push(gh_user(login));
        self
    }

    /// A full profile served by `get_user`.
    pub fn with_user(mut self, login: &str, name: &str) -> Self {
        self.users.insert(
            login.to_string(),
            GhUser {
                login: login.to_string(),
                name: Some(name.to_string()),
                ..Default::default()
            },
        );
        self
    }

    /// A file served by the contents API, unencoded.
    pub fn with_contents(mut self, org: &str, repo: &str, path: &str, body: &str) -> Self {
        self.contents.insert(
            (org.to_string(), repo.to_string(), path.to_string()),
            GhContent {
                path: path.to_string(),
                content: Some(body.to_string()),
                encoding: None,
            },
        );
        self
    }

    /// A file present in the default branch tree and served raw.
    pub fn with_tree_file(mut self, org: &str, repo: &str, path: &str, body: &str) -> Self {
        self.trees
            .entry(key(org, repo))
            .or_insert_with(|| GhTree {
                sha: "tip".to_string(),
                tree: Vec::new(),
                truncated: false,
            })
            .tree
            .push(GhTreeEntry {
                path: path.to_string(),
                kind: "blob".to_string(),
            });
        self.raw.insert(
            (org.to_string(), repo.to_string(), path.to_string()),
            body.to_string(),
        );
        self
    }

    /// Make every call of `method` fail with a non-retryable API error.
    pub fn failing(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    /// Split listings into pages of `size`; zero serves everything at once.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Every call made so far, as `method org/repo` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(' ').next() == Some(method))
            .count()
    }

    fn record(&self, method: &'static str, target: String) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(format!("{method} {target}"));
        if self.failing.contains(method) {
            return Err(PlatformError::api(format!("{method} failed")));
        }
        Ok(())
    }

    fn list<T: Clone>(&self, source: &HashMap<RepoKey, Vec<T>>, org: &str, repo: &str, page: u32) -> Page<T> {
        let items = source.get(&key(org, repo)).map(Vec::as_slice).unwrap_or(&[]);
        paged(items, page, self.page_size)
    }
}

fn since_filter<T>(items: Page<T>, since: Option<DateTime<Utc>>, updated: impl Fn(&T) -> DateTime<Utc>) -> Page<T> {
    match since {
        None => items,
        Some(since) => Page {
            items: items.items.into_iter().filter(|i| updated(i) >= since).collect(),
            next_page: items.next_page,
        },
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn get_org(&self, org: &str) -> Result<GhOrganization> {
        self.record("get_org", org.to_string())?;
        self.orgs
            .get(org)
            .cloned()
            .ok_or_else(|| PlatformError::not_found(org))
    }

    async fn list_org_repos(&self, org: &str, page: u32) -> Result<Page<GhRepository>> {
        self.record("list_org_repos", org.to_string())?;
        let repos: Vec<_> = self
            .repos
            .iter()
            .filter(|((o, _), _)| o == org)
            .map(|(_, r)| r.clone())
            .collect();
        Ok(paged(&repos, page, self.page_size))
    }

    async fn get_repo(&self, org: &str, repo: &str) -> Result<GhRepository> {
        self.record("get_repo", format!("{org}/{repo}"))?;
        self.repos
            .get(&key(org, repo))
            .cloned()
            .ok_or_else(|| PlatformError::not_found(format!("{org}/{repo}")))
    }

    async fn list_issues(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhIssue>> {
        self.record("list_issues", format!("{org}/{repo} since={since:?}"))?;
        let listed = self.list(&self.issues, org, repo, page);
        Ok(since_filter(listed, since, |i| i.updated_at))
    }

    async fn list_issue_comments(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhIssueComment>> {
        self.record("list_issue_comments", format!("{org}/{repo} since={since:?}"))?;
        let listed = self.list(&self.issue_comments, org, repo, page);
        Ok(since_filter(listed, since, |c| c.updated_at))
    }

    async fn list_pull_requests(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhPullRequest>> {
        self.record("list_pull_requests", format!("{org}/{repo}"))?;
        Ok(self.list(&self.pull_requests, org, repo, page))
    }

    async fn list_reviews(
        &self,
        org: &str,
        repo: &str,
        number: i64,
        page: u32,
    ) -> Result<Page<GhReview>> {
        self.record("list_reviews", format!("{org}/{repo}#{number}"))?;
        let items = self
            .reviews
            .get(&(org.to_string(), repo.to_string(), number))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Ok(paged(items, page, self.page_size))
    }

    async fn list_pull_request_files(
        &self,
        org: &str,
        repo: &str,
        number: i64,
        page: u32,
    ) -> Result<Page<GhPullRequestFile>> {
        self.record("list_pull_request_files", format!("{org}/{repo}#{number}"))?;
        let items = self
            .files
            .get(&(org.to_string(), repo.to_string(), number))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Ok(paged(items, page, self.page_size))
    }

    async fn list_review_comments(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<GhReviewComment>> {
        self.record("list_review_comments", format!("{org}/{repo} since={since:?}"))?;
        let listed = self.list(&self.review_comments, org, repo, page);
        Ok(since_filter(listed, since, |c| c.updated_at))
    }

    async fn list_repo_comments(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhRepoComment>> {
        self.record("list_repo_comments", format!("{org}/{repo}"))?;
        Ok(self.list(&self.repo_comments, org, repo, page))
    }

    async fn list_repo_events(&self, org: &str, repo: &str, page: u32) -> Result<Page<GhEvent>> {
        self.record("list_repo_events", format!("{org}/{repo}"))?;
        Ok(self.list(&self.events, org, repo, page))
    }

    async fn list_issue_events(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Page<GhIssueEvent>> {
        self.record("list_issue_events", format!("{org}/{repo}"))?;
        Ok(self.list(&self.issue_events, org, repo, page))
    }

    async fn list_labels(&self, org: &str, repo: &str, page: u32) -> Result<Page<GhLabel>> {
        self.record("list_labels", format!("{org}/{repo}"))?;
        Ok(self.list(&self.labels, org, repo, page))
    }

    async fn list_members(&self, org: &str, page: u32) -> Result<Page<GhUser>> {
        self.record("list_members", org.to_string())?;
        let items = self.members.get(org).map(Vec::as_slice).unwrap_or(&[]);
        Ok(paged(items, page, self.page_size))
    }

    async fn get_user(&self, login: &str) -> Result<GhUser> {
        self.record("get_user", login.to_string())?;
        self.users
            .get(login)
            .cloned()
            .ok_or_else(|| PlatformError::not_found(format!("user {login}")))
    }

    async fn get_contents(&self, org: &str, repo: &str, path: &str) -> Result<GhContent> {
        self.record("get_contents", format!("{org}/{repo}/{path}"))?;
        self.contents
            .get(&(org.to_string(), repo.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| PlatformError::not_found(path))
    }

    async fn latest_commit_sha(&self, org: &str, repo: &str, branch: &str) -> Result<String> {
        self.record("latest_commit_sha", format!("{org}/{repo}@{branch}"))?;
        self.trees
            .get(&key(org, repo))
            .map(|tree| tree.sha.clone())
            .ok_or_else(|| PlatformError::not_found(branch))
    }

    async fn get_tree(&self, org: &str, repo: &str, sha: &str, _recursive: bool) -> Result<GhTree> {
        self.record("get_tree", format!("{org}/{repo}@{sha}"))?;
        self.trees
            .get(&key(org, repo))
            .cloned()
            .ok_or_else(|| PlatformError::not_found(sha))
    }

    async fn fetch_raw(&self, org: &str, repo: &str, branch: &str, path: &str) -> Result<String> {
        self.record("fetch_raw", format!("{org}/{repo}@{branch}/{path}"))?;
        self.raw
            .get(&(org.to_string(), repo.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| PlatformError::not_found(path))
    }
}

/// A scripted [`ZenHubApi`]. Untracked issues are `NotFound`.
#[derive(Default)]
pub struct FakeZenHub {
    issues: HashMap<(i64, i64), ZhIssueData>,
    failing: HashSet<(i64, i64)>,
    calls: Mutex<usize>,
}

impl FakeZenHub {
    pub fn with_pipeline(mut self, repo_id: i64, number: i64, pipeline: &str) -> Self {
        self.issues.insert(
            (repo_id, number),
            ZhIssueData {
                pipeline: ZhPipeline {
                    name: pipeline.to_string(),
                },
                ..Default::default()
            },
        );
        self
    }

    pub fn failing_issue(mut self, repo_id: i64, number: i64) -> Self {
        self.failing.insert((repo_id, number));
        self
    }

    pub fn calls(&self) -> usize {
        *self
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ZenHubApi for FakeZenHub {
    async fn get_issue_data(&self, repo_id: i64, issue_number: i64) -> Result<ZhIssueData> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
        if self.failing.contains(&(repo_id, issue_number)) {
            return Err(PlatformError::network("connection reset"));
        }
        self.issues
            .get(&(repo_id, issue_number))
            .cloned()
            .ok_or_else(|| PlatformError::not_found(format!("issue {issue_number}")))
    }
}
