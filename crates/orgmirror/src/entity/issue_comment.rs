//! IssueComment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issue_comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub org_login: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub repo_name: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub issue_number: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub issue_comment_id: i64,

    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub author: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
