//! PullRequest entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::string_list::StringList;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pull_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub org_login: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub repo_name: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub pull_request_number: i64,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    #[sea_orm(column_type = "Json")]
    pub labels: StringList,
    pub created_at: DateTimeUtc,
    /// Compared against the upstream value to skip unchanged pull requests.
    pub updated_at: DateTimeUtc,
    pub closed_at: Option<DateTimeUtc>,
    pub merged_at: Option<DateTimeUtc>,
    pub state: String,
    pub author: String,
    #[sea_orm(column_type = "Json")]
    pub assignees: StringList,
    #[sea_orm(column_type = "Json")]
    pub requested_reviewers: StringList,
    /// Paths touched by the pull request.
    #[sea_orm(column_type = "Json")]
    pub files: StringList,
    pub base_commit_sha: String,
    pub head_commit_sha: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
