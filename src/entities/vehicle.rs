//! Vehicle entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Vehicle database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    /// Fleet identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub vehicle_id: String,
    /// Unique plate number
    #[sea_orm(unique)]
    pub plate_no: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
