//! Route entity - a directed origin to destination pair with a fixed distance.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Route database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "routes")]
pub struct Model {
    /// Numeric route id
    #[sea_orm(primary_key)]
    pub route_id: i64,
    /// Origin label, e.g. `"Antipolo"`
    pub origin: String,
    /// Destination label
    pub destination: String,
    /// Distance in kilometres, zero for self-routes
    pub distance: f64,
}

/// Defines relationships between Route and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A route is priced by its fare rows
    #[sea_orm(has_many = "super::fare::Entity")]
    Fares,
}

impl Related<super::fare::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
