//! Organization entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A mirrored GitHub organization. Replaced wholesale on every sync.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    /// Organization login (e.g. `istio`).
    #[sea_orm(primary_key, auto_increment = false)]
    pub org_login: String,
    pub company: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
