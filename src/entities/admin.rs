//! Admin role profile.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Admin database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admins")]
pub struct Model {
    /// `A` followed by the user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub admin_id: String,
    /// Back-reference to `users`
    pub user_id: Option<i64>,
    /// Free-form role description
    pub role: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::UserId"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
