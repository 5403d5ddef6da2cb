//! BotActivity entity: per-repository incremental sync bookmarks.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Start times of the last successful incremental pass, one column per entity kind.
///
/// A null column means the kind has never been synced and the next pass fetches
/// everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bot_activities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub org_login: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub repo_name: String,

    pub last_issue_sync_start: Option<DateTimeUtc>,
    pub last_issue_comment_sync_start: Option<DateTimeUtc>,
    pub last_pull_request_review_comment_sync_start: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// The bookmarked entity kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Bookmark {
    Issues,
    IssueComments,
    PullRequestReviewComments,
}

impl Bookmark {
    /// The column backing this bookmark.
    pub fn column(self) -> Column {
        match self {
            Self::Issues => Column::LastIssueSyncStart,
            Self::IssueComments => Column::LastIssueCommentSyncStart,
            Self::PullRequestReviewComments => Column::LastPullRequestReviewCommentSyncStart,
        }
    }

    pub fn get(self, activity: &Model) -> Option<DateTimeUtc> {
        match self {
            Self::Issues => activity.last_issue_sync_start,
            Self::IssueComments => activity.last_issue_comment_sync_start,
            Self::PullRequestReviewComments => activity.last_pull_request_review_comment_sync_start,
        }
    }

    pub fn set(self, activity: &mut Model, value: Option<DateTimeUtc>) {
        match self {
            Self::Issues => activity.last_issue_sync_start = value,
            Self::IssueComments => activity.last_issue_comment_sync_start = value,
            Self::PullRequestReviewComments => {
                activity.last_pull_request_review_comment_sync_start = value
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::IssueComments => "issue_comments",
            Self::PullRequestReviewComments => "pull_request_review_comments",
        }
    }
}

impl std::fmt::Display for Bookmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Model {
    /// An empty activity row for a repository.
    pub fn new(org_login: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            org_login: org_login.into(),
            repo_name: repo_name.into(),
            ..Default::default()
        }
    }
}
