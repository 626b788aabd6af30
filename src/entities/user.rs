//! User entity - the shared identity row behind every role profile.
//!
//! Exactly one role table (`admins`, `drivers`, `conductors`, `commuters`) references each user.
//! Passwords are stored and compared as plain text, which is a known gap inherited from the
//! existing database format.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role tag stored in `users.user_type`
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum UserType {
    /// Back-office administrator
    #[sea_orm(string_value = "Admin")]
    Admin,
    /// Fare-paying passenger
    #[sea_orm(string_value = "Commuter")]
    Commuter,
    /// Vehicle driver
    #[sea_orm(string_value = "Driver")]
    Driver,
    /// On-board fare collector
    #[sea_orm(string_value = "Conductor")]
    Conductor,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Numeric identity, assigned by `SQLite`
    #[sea_orm(primary_key)]
    pub user_id: i64,
    /// Unique login name
    #[sea_orm(unique)]
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Optional unique email address
    pub email: Option<String>,
    /// Opaque password, compared by equality
    #[serde(skip_serializing)]
    pub password: String,
    /// Which role table holds this user's profile
    pub user_type: UserType,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
