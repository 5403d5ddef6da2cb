//! Maintainer entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::string_list::StringList;

/// A user with review or approval authority over paths in an organization.
///
/// Each path has the form `repo/dir`, where an empty `dir` means the whole
/// repository.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "maintainers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub org_login: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_login: String,
    #[sea_orm(column_type = "Json")]
    pub paths: StringList,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn new(org_login: impl Into<String>, user_login: impl Into<String>) -> Self {
        Self {
            org_login: org_login.into(),
            user_login: user_login.into(),
            paths: StringList::new(),
        }
    }
}
