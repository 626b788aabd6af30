//! Read-only mapping of the `route_view` view, which labels each route as
//! `"<origin> to <destination>"`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Route label row
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "route_view")]
pub struct Model {
    /// Route being labelled
    #[sea_orm(primary_key)]
    pub route_id: i64,
    /// Display label
    pub origin_to_destination: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
