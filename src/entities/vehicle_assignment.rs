//! Vehicle assignment entity - a timestamped pairing of one vehicle with a driver and a conductor.
//!
//! Assignments are append-only. The operative assignment for a crew member is the one with
//! the latest `assignment_date`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Vehicle assignment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicle_assignment")]
pub struct Model {
    /// Numeric assignment id
    #[sea_orm(primary_key)]
    pub assignment_id: i64,
    /// Assigned vehicle
    pub vehicle_id: String,
    /// Assigned driver
    pub driver_id: String,
    /// Assigned conductor
    pub conductor_id: String,
    /// When the assignment was made
    pub assignment_date: Option<DateTime>,
}

/// Defines relationships between `VehicleAssignment` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each assignment points at one vehicle
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::VehicleId"
    )]
    Vehicle,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
