//! Transaction entity - an immutable record of a fare collected on board.
//!
//! Rows are only ever appended. `transaction_date` is assigned by the recorder at insert time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Server-assigned id of the form `T<n>`
    #[sea_orm(primary_key, auto_increment = false)]
    pub transaction_id: String,
    /// Paying commuter
    pub commuter_id: Option<String>,
    /// Route travelled
    pub route_id: Option<i64>,
    /// Vehicle boarded
    pub vehicle_id: Option<String>,
    /// Conductor who collected the fare
    pub conductor_id: Option<String>,
    /// Fare row the amount was derived from
    pub fare_id: Option<i64>,
    /// Amount collected
    pub total_fare: f64,
    /// When the transaction was recorded
    pub transaction_date: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::RouteId",
        to = "super::route::Column::RouteId"
    )]
    Route,
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::VehicleId"
    )]
    Vehicle,
}

impl Related<super::route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Route.def()
    }
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
