//! Issue entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::string_list::StringList;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub org_login: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub repo_name: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub issue_number: i64,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    /// Label names; resolved against the `labels` table by readers.
    #[sea_orm(column_type = "Json")]
    pub labels: StringList,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub closed_at: Option<DateTimeUtc>,
    pub state: String,
    pub author: String,
    #[sea_orm(column_type = "Json")]
    pub assignees: StringList,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
