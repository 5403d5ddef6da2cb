//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A GitHub account seen anywhere during a sync.
///
/// Listing endpoints only return stubs, so `name` is empty until the full
/// profile has been fetched.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_login: String,
    #[sea_orm(default_value = "")]
    pub name: String,
    pub company: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A login-only record.
    pub fn stub(login: impl Into<String>) -> Self {
        Self {
            user_login: login.into(),
            name: String::new(),
            company: None,
            avatar_url: None,
        }
    }

    /// Whether the full profile is still missing.
    pub fn is_stub(&self) -> bool {
        self.name.is_empty()
    }
}
