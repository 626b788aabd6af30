//! Driver role profile.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Driver database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "drivers")]
pub struct Model {
    /// `D` followed by the user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub driver_id: String,
    /// Back-reference to `users`
    pub user_id: i64,
    /// Driver's license number
    pub license_no: Option<i64>,
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
