//! Repository entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Branch assumed when the upstream payload omits `default_branch`.
pub const DEFAULT_BRANCH: &str = "master";

/// A mirrored repository, owned by exactly one organization.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub org_login: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub repo_name: String,

    /// Upstream numeric id. ZenHub addresses repositories by this value.
    pub repo_number: i64,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(default_value = "master")]
    pub default_branch: String,
    pub watchers: i32,
    pub stars: i32,
    pub forks: i32,
    pub open_issues: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// `org/repo`, the form webhook payloads and log lines use.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.org_login, self.repo_name)
    }
}
