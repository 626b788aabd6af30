//! Commuter role profile.
//!
//! `discount_type` holds the label chosen on the commuter's profile screen
//! (`None`, `Student`, `Senior Citizen`, `PWD`) and drives which fare price applies.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Commuter database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commuters")]
pub struct Model {
    /// `P` followed by the user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub commuter_id: String,
    /// Back-reference to `users`
    pub user_id: i64,
    /// Contact phone number
    pub contact_no: Option<String>,
    /// Discount label, `None` for full-price passengers
    pub discount_type: Option<String>,
    /// Route the commuter rides most often
    pub preferred_route: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::UserId"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::PreferredRoute",
        to = "super::route::Column::RouteId"
    )]
    PreferredRoute,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
