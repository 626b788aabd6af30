//! Feedback entity - a commuter's rating of a driver and/or conductor.
//!
//! The table has no creation timestamp.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Feedback database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedbacks")]
pub struct Model {
    /// Numeric feedback id
    #[sea_orm(primary_key)]
    pub feedback_id: i64,
    /// Commuter giving the feedback
    pub commuter_id: Option<String>,
    /// Driver being rated
    pub driver_id: Option<String>,
    /// Conductor being rated
    pub conductor_id: Option<String>,
    /// Rating between 0.0 and 5.0
    pub rating: Option<f64>,
    /// Free-text comment
    pub comment: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
