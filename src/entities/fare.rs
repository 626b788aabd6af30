//! Fare entity - the full and discounted price of a route.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fare database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fares")]
pub struct Model {
    /// Numeric fare id
    #[sea_orm(primary_key)]
    pub fare_id: i64,
    /// Route this fare prices
    pub route_id: Option<i64>,
    /// Full (Regular) price
    pub price_fare: f64,
    /// Price for Student, Senior and PWD passengers
    pub discount_fare: Option<f64>,
}

/// Defines relationships between Fare and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each fare belongs to one route
    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::RouteId",
        to = "super::route::Column::RouteId"
    )]
    Route,
}

impl Related<super::route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Route.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
