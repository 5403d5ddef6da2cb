//! Conversion from GitHub payloads to mirror entities.
//!
//! Every function is pure. Functions for records that reference people also
//! return the user stubs they discovered, so callers can feed them to the
//! run's user registry (or write them straight through the cache).

use super::types::{
    GhIssue, GhIssueComment, GhLabel, GhOrganization, GhPullRequest, GhPullRequestFile,
    GhRepoComment, GhRepository, GhReview, GhReviewComment, GhUser,
};
use crate::entity::{
    issue, issue_comment, label, organization, pull_request, pull_request_review,
    pull_request_review_comment, repo_comment, repository, user,
};
use crate::entity::string_list::StringList;
use crate::platform::PlatformError;

/// A converted record plus the users it mentions.
pub type Converted<T> = (T, Vec<user::Model>);

/// The trailing number of an API URL such as
/// `https://api.github.com/repos/istio/istio/issues/42`.
pub fn number_from_url(url: &str) -> Option<i64> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

fn login_of(user: Option<&GhUser>) -> String {
    user.map(|u| u.login.clone()).unwrap_or_default()
}

fn label_names(labels: &[GhLabel]) -> StringList {
    labels.iter().map(|l| l.name.clone()).collect()
}

fn logins(users: &[GhUser]) -> StringList {
    users.iter().map(|u| u.login.clone()).collect()
}

/// Stubs for every non-empty login, in order of appearance.
fn discovered<'a>(users: impl IntoIterator<Item = &'a GhUser>) -> Vec<user::Model> {
    users
        .into_iter()
        .filter(|u| !u.login.is_empty())
        .map(convert_user)
        .collect()
}

pub fn convert_user(user: &GhUser) -> user::Model {
    user::Model {
        user_login: user.login.clone(),
        name: user.name.clone().unwrap_or_default(),
        company: user.company.clone(),
        avatar_url: user.avatar_url.clone(),
    }
}

pub fn convert_org(org: &GhOrganization) -> organization::Model {
    organization::Model {
        org_login: org.login.clone(),
        company: org.company.clone(),
        description: org.description.clone(),
        avatar_url: org.avatar_url.clone(),
    }
}

pub fn convert_repo(org: &str, repo: &GhRepository) -> repository::Model {
    repository::Model {
        org_login: org.to_string(),
        repo_name: repo.name.clone(),
        repo_number: repo.id,
        description: repo.description.clone(),
        default_branch: repo
            .default_branch
            .clone()
            .unwrap_or_else(|| repository::DEFAULT_BRANCH.to_string()),
        watchers: repo.watchers_count,
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        open_issues: repo.open_issues_count,
    }
}

pub fn convert_label(org: &str, repo: &str, label: &GhLabel) -> label::Model {
    label::Model {
        org_login: org.to_string(),
        repo_name: repo.to_string(),
        label_name: label.name.clone(),
        description: label.description.clone(),
        color: label.color.clone(),
    }
}

pub fn convert_issue(org: &str, repo: &str, issue: &GhIssue) -> Converted<issue::Model> {
    let model = issue::Model {
        org_login: org.to_string(),
        repo_name: repo.to_string(),
        issue_number: issue.number,
        title: issue.title.clone(),
        body: issue.body.clone().unwrap_or_default(),
        labels: label_names(&issue.labels),
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        closed_at: issue.closed_at,
        state: issue.state.clone(),
        author: login_of(issue.user.as_ref()),
        assignees: logins(&issue.assignees),
    };
    let users = discovered(issue.user.iter().chain(&issue.assignees));
    (model, users)
}

pub fn convert_issue_comment(
    org: &str,
    repo: &str,
    comment: &GhIssueComment,
) -> Result<Converted<issue_comment::Model>, PlatformError> {
    let issue_number = number_from_url(&comment.issue_url).ok_or_else(|| {
        PlatformError::decode(format!(
            "comment {} has no issue number in {:?}",
            comment.id, comment.issue_url
        ))
    })?;

    let model = issue_comment::Model {
        org_login: org.to_string(),
        repo_name: repo.to_string(),
        issue_number,
        issue_comment_id: comment.id,
        body: comment.body.clone().unwrap_or_default(),
        author: login_of(comment.user.as_ref()),
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    };
    Ok((model, discovered(comment.user.iter())))
}

/// `files` is the PR's changed file list, fetched separately.
pub fn convert_pull_request(
    org: &str,
    repo: &str,
    pr: &GhPullRequest,
    files: &[GhPullRequestFile],
) -> Converted<pull_request::Model> {
    let model = pull_request::Model {
        org_login: org.to_string(),
        repo_name: repo.to_string(),
        pull_request_number: pr.number,
        title: pr.title.clone(),
        body: pr.body.clone().unwrap_or_default(),
        labels: label_names(&pr.labels),
        created_at: pr.created_at,
        updated_at: pr.updated_at,
        closed_at: pr.closed_at,
        merged_at: pr.merged_at,
        state: pr.state.clone(),
        author: login_of(pr.user.as_ref()),
        assignees: logins(&pr.assignees),
        requested_reviewers: logins(&pr.requested_reviewers),
        files: files.iter().map(|f| f.filename.clone()).collect(),
        base_commit_sha: pr.base.sha.clone(),
        head_commit_sha: pr.head.sha.clone(),
    };
    let users = discovered(
        pr.user
            .iter()
            .chain(&pr.assignees)
            .chain(&pr.requested_reviewers),
    );
    (model, users)
}

pub fn convert_pull_request_review(
    org: &str,
    repo: &str,
    pull_request_number: i64,
    review: &GhReview,
) -> Converted<pull_request_review::Model> {
    let model = pull_request_review::Model {
        org_login: org.to_string(),
        repo_name: repo.to_string(),
        pull_request_number,
        pull_request_review_id: review.id,
        body: review.body.clone().unwrap_or_default(),
        author: login_of(review.user.as_ref()),
        submitted_at: review.submitted_at,
        state: review.state.clone(),
    };
    (model, discovered(review.user.iter()))
}

pub fn convert_pull_request_review_comment(
    org: &str,
    repo: &str,
    comment: &GhReviewComment,
) -> Result<Converted<pull_request_review_comment::Model>, PlatformError> {
    let pull_request_number = number_from_url(&comment.pull_request_url).ok_or_else(|| {
        PlatformError::decode(format!(
            "review comment {} has no pull request number in {:?}",
            comment.id, comment.pull_request_url
        ))
    })?;

    let model = pull_request_review_comment::Model {
        org_login: org.to_string(),
        repo_name: repo.to_string(),
        pull_request_number,
        pull_request_review_comment_id: comment.id,
        body: comment.body.clone().unwrap_or_default(),
        author: login_of(comment.user.as_ref()),
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    };
    Ok((model, discovered(comment.user.iter())))
}

pub fn convert_repo_comment(
    org: &str,
    repo: &str,
    comment: &GhRepoComment,
) -> Converted<repo_comment::Model> {
    let model = repo_comment::Model {
        org_login: org.to_string(),
        repo_name: repo.to_string(),
        repo_comment_id: comment.id,
        body: comment.body.clone().unwrap_or_default(),
        author: login_of(comment.user.as_ref()),
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        commit_sha: comment.commit_id.clone(),
    };
    (model, discovered(comment.user.iter()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn gh_user(login: &str) -> GhUser {
        GhUser {
            login: login.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn number_from_url_takes_last_segment() {
        assert_eq!(
            number_from_url("https://api.github.com/repos/istio/istio/issues/42"),
            Some(42)
        );
        assert_eq!(number_from_url("https://api.github.com/repos/a/b/pulls/7/"), Some(7));
        assert_eq!(number_from_url(""), None);
        assert_eq!(number_from_url("https://api.github.com/repos/a/b/pulls"), None);
    }

    #[test]
    fn issue_collects_labels_and_people() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let issue = GhIssue {
            number: 12,
            title: "flaky test".to_string(),
            body: None,
            labels: vec![GhLabel {
                name: "kind/bug".to_string(),
                ..Default::default()
            }],
            created_at: ts,
            updated_at: ts,
            closed_at: None,
            state: "open".to_string(),
            user: Some(gh_user("alice")),
            assignees: vec![gh_user("bob")],
        };

        let (model, users) = convert_issue("istio", "istio", &issue);

        assert_eq!(model.issue_number, 12);
        assert_eq!(model.body, "");
        assert_eq!(model.author, "alice");
        assert!(model.labels.contains("kind/bug"));
        assert!(model.assignees.contains("bob"));
        let found: Vec<_> = users.iter().map(|u| u.user_login.as_str()).collect();
        assert_eq!(found, ["alice", "bob"]);
        assert!(users.iter().all(|u| u.is_stub()));
    }

    #[test]
    fn issue_comment_needs_an_issue_number() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut comment = GhIssueComment {
            id: 900,
            body: Some("lgtm".to_string()),
            user: Some(gh_user("carol")),
            created_at: ts,
            updated_at: ts,
            issue_url: "https://api.github.com/repos/istio/istio/issues/5".to_string(),
        };

        let (model, users) = convert_issue_comment("istio", "istio", &comment).unwrap();
        assert_eq!(model.issue_number, 5);
        assert_eq!(model.issue_comment_id, 900);
        assert_eq!(users.len(), 1);

        comment.issue_url.clear();
        assert!(convert_issue_comment("istio", "istio", &comment).is_err());
    }

    #[test]
    fn pull_request_records_files_and_reviewers() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let pr = GhPullRequest {
            number: 3,
            title: "Add feature".to_string(),
            body: Some("body".to_string()),
            labels: vec![],
            created_at: ts,
            updated_at: ts,
            closed_at: None,
            merged_at: None,
            state: "open".to_string(),
            user: Some(gh_user("dave")),
            assignees: vec![],
            requested_reviewers: vec![gh_user("erin")],
            base: Default::default(),
            head: Default::default(),
        };
        let files = vec![GhPullRequestFile {
            filename: "pkg/a.go".to_string(),
        }];

        let (model, users) = convert_pull_request("istio", "api", &pr, &files);

        assert!(model.files.contains("pkg/a.go"));
        assert!(model.requested_reviewers.contains("erin"));
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn anonymous_author_discovers_no_user() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let comment = GhRepoComment {
            id: 1,
            body: None,
            user: None,
            created_at: ts,
            updated_at: ts,
            commit_id: "abc".to_string(),
        };

        let (model, users) = convert_repo_comment("istio", "istio", &comment);
        assert_eq!(model.author, "");
        assert_eq!(model.commit_sha, "abc");
        assert!(users.is_empty());
    }

    #[test]
    fn repo_without_default_branch_uses_fallback() {
        let repo = GhRepository {
            id: 7,
            name: "bots".to_string(),
            ..Default::default()
        };
        let model = convert_repo("istio", &repo);
        assert_eq!(model.default_branch, repository::DEFAULT_BRANCH);
        assert_eq!(model.repo_number, 7);
    }
}
