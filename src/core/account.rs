//! User accounts and role profiles.
//!
//! Every user has exactly one role row. Role ids are the role prefix followed by the numeric
//! user id (`A12`, `D12`, `C12`, `P12`), so the users row has to exist before its role row
//! can be named. Both inserts share one atomic unit.

use crate::{
    core::fare::PassengerCategory,
    entities::{
        Admin, Commuter, Conductor, Driver, User, UserType, admin, commuter, conductor, driver,
        user,
    },
    errors::{Error, Result},
    gateway::Gateway,
};
use sea_orm::{ConnectionTrait, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Identity fields shared by every role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    /// Unique login name
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Optional unique email
    pub email: Option<String>,
    /// Stored as given
    pub password: String,
}

/// Role-specific fields supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind")]
pub enum NewRole {
    /// Administrator
    Admin {
        /// Free-text role description
        role: Option<String>,
    },
    /// Driver
    Driver {
        /// Licence number
        license_no: Option<i64>,
    },
    /// Conductor
    Conductor {
        /// Licence number
        license_no: Option<i64>,
    },
    /// Commuter
    Commuter {
        /// Phone number
        contact_no: Option<String>,
        /// `None`, `Student`, `Senior Citizen` or `PWD`
        discount_type: Option<String>,
        /// Route shown first on the commuter's screens
        preferred_route: Option<i64>,
    },
}

impl NewRole {
    const fn user_type(&self) -> UserType {
        match self {
            Self::Admin { .. } => UserType::Admin,
            Self::Driver { .. } => UserType::Driver,
            Self::Conductor { .. } => UserType::Conductor,
            Self::Commuter { .. } => UserType::Commuter,
        }
    }
}

/// The role row attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum RoleProfile {
    /// Administrator profile
    Admin(admin::Model),
    /// Driver profile
    Driver(driver::Model),
    /// Conductor profile
    Conductor(conductor::Model),
    /// Commuter profile
    Commuter(commuter::Model),
}

impl RoleProfile {
    /// The role-specific id (`A12`, `D12`, ...).
    #[must_use]
    pub fn role_id(&self) -> &str {
        match self {
            Self::Admin(admin) => &admin.admin_id,
            Self::Driver(driver) => &driver.driver_id,
            Self::Conductor(conductor) => &conductor.conductor_id,
            Self::Commuter(commuter) => &commuter.commuter_id,
        }
    }
}

/// A user together with their role row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    /// Identity row
    pub user: user::Model,
    /// Role row
    pub role: RoleProfile,
}

/// Fields a commuter can change on their own profile. `None` for the password keeps the
/// current one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommuterUpdate {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email, blank clears it
    pub email: Option<String>,
    /// New password
    pub password: Option<String>,
    /// Phone number
    pub contact_no: Option<String>,
    /// Discount label
    pub discount_type: Option<String>,
    /// Preferred route
    pub preferred_route: Option<i64>,
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput {
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalizes a discount label, rejecting anything that is not a known category.
fn discount_label(label: Option<String>) -> Result<String> {
    let label = optional(label).unwrap_or_else(|| "None".to_string());
    PassengerCategory::from_discount_type(Some(&label))?;
    Ok(label)
}

/// Creates a user and their role row.
///
/// # Arguments
/// * `new_user` - Identity fields shared by every role
/// * `role` - Which role to create, with its role-specific fields
///
/// # Errors
/// * `Error::InvalidInput` - a required name field is blank
/// * `Error::InvalidCategory` - a commuter's discount label is unknown
/// * `Error::ConstraintViolation` - the username or email is taken, or the role row is
///   rejected (for example a preferred route that does not exist)
#[instrument(skip(gateway, new_user, role), fields(username = %new_user.username))]
pub async fn register(gateway: &Gateway, new_user: NewUser, role: NewRole) -> Result<Profile> {
    let username = required("Username", &new_user.username)?;
    let first_name = required("First name", &new_user.first_name)?;
    let last_name = required("Last name", &new_user.last_name)?;
    let role = match role {
        NewRole::Commuter {
            contact_no,
            discount_type,
            preferred_route,
        } => NewRole::Commuter {
            contact_no: optional(contact_no),
            discount_type: Some(discount_label(discount_type)?),
            preferred_route,
        },
        other => other,
    };

    let user = user::ActiveModel {
        username: Set(username),
        first_name: Set(first_name),
        last_name: Set(last_name),
        email: Set(optional(new_user.email)),
        password: Set(new_user.password),
        user_type: Set(role.user_type()),
        ..Default::default()
    };

    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                let user = user.insert(txn).await?;
                let role = insert_role(txn, user.user_id, role).await?;
                info!(
                    "Registered {:?} {} as {}",
                    user.user_type,
                    user.username,
                    role.role_id()
                );
                Ok(Profile { user, role })
            })
        })
        .await
}

async fn insert_role<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    role: NewRole,
) -> Result<RoleProfile> {
    let profile = match role {
        NewRole::Admin { role } => RoleProfile::Admin(
            admin::ActiveModel {
                admin_id: Set(format!("A{user_id}")),
                user_id: Set(Some(user_id)),
                role: Set(role),
            }
            .insert(db)
            .await?,
        ),
        NewRole::Driver { license_no } => RoleProfile::Driver(
            driver::ActiveModel {
                driver_id: Set(format!("D{user_id}")),
                user_id: Set(user_id),
                license_no: Set(license_no),
            }
            .insert(db)
            .await?,
        ),
        NewRole::Conductor { license_no } => RoleProfile::Conductor(
            conductor::ActiveModel {
                conductor_id: Set(format!("C{user_id}")),
                user_id: Set(user_id),
                license_no: Set(license_no),
            }
            .insert(db)
            .await?,
        ),
        NewRole::Commuter {
            contact_no,
            discount_type,
            preferred_route,
        } => RoleProfile::Commuter(
            commuter::ActiveModel {
                commuter_id: Set(format!("P{user_id}")),
                user_id: Set(user_id),
                contact_no: Set(contact_no),
                discount_type: Set(discount_type),
                preferred_route: Set(preferred_route),
            }
            .insert(db)
            .await?,
        ),
    };
    Ok(profile)
}

/// Loads a user and their role row.
///
/// # Errors
/// * `Error::ReferenceNotFound` - no such user, or the user has no role row
pub async fn load_profile(gateway: &Gateway, user_id: i64) -> Result<Profile> {
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                let user = User::find_by_id(user_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| Error::not_found("user", user_id))?;
                profile_for(txn, user).await
            })
        })
        .await
}

/// Loads a profile by username; `None` when the username is unknown.
pub async fn find_profile_by_username(
    gateway: &Gateway,
    username: &str,
) -> Result<Option<Profile>> {
    let username = username.trim().to_string();
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                let Some(user) = User::find()
                    .filter(user::Column::Username.eq(username))
                    .one(txn)
                    .await?
                else {
                    return Ok(None);
                };
                profile_for(txn, user).await.map(Some)
            })
        })
        .await
}

async fn profile_for<C: ConnectionTrait>(db: &C, user: user::Model) -> Result<Profile> {
    let id = user.user_id;
    let role = match user.user_type {
        UserType::Admin => Admin::find()
            .filter(admin::Column::UserId.eq(id))
            .one(db)
            .await?
            .map(RoleProfile::Admin)
            .ok_or_else(|| Error::not_found("admin", id))?,
        UserType::Driver => Driver::find()
            .filter(driver::Column::UserId.eq(id))
            .one(db)
            .await?
            .map(RoleProfile::Driver)
            .ok_or_else(|| Error::not_found("driver", id))?,
        UserType::Conductor => Conductor::find()
            .filter(conductor::Column::UserId.eq(id))
            .one(db)
            .await?
            .map(RoleProfile::Conductor)
            .ok_or_else(|| Error::not_found("conductor", id))?,
        UserType::Commuter => Commuter::find()
            .filter(commuter::Column::UserId.eq(id))
            .one(db)
            .await?
            .map(RoleProfile::Commuter)
            .ok_or_else(|| Error::not_found("commuter", id))?,
    };
    Ok(Profile { user, role })
}

/// Updates a commuter's identity and commuter fields together and returns the fresh profile.
///
/// # Errors
/// * `Error::ReferenceNotFound` - the user has no commuter row
/// * `Error::InvalidCategory` - unknown discount label
/// * `Error::ConstraintViolation` - the email is taken or the preferred route does not exist
#[instrument(skip(gateway, update))]
pub async fn update_commuter_profile(
    gateway: &Gateway,
    user_id: i64,
    update: CommuterUpdate,
) -> Result<Profile> {
    let first_name = required("First name", &update.first_name)?;
    let last_name = required("Last name", &update.last_name)?;
    let discount_type = discount_label(update.discount_type)?;

    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                let commuter = Commuter::find()
                    .filter(commuter::Column::UserId.eq(user_id))
                    .one(txn)
                    .await?
                    .ok_or_else(|| Error::not_found("commuter", user_id))?;
                let user = User::find_by_id(user_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| Error::not_found("user", user_id))?;

                let mut user: user::ActiveModel = user.into();
                user.first_name = Set(first_name);
                user.last_name = Set(last_name);
                user.email = Set(optional(update.email));
                if let Some(password) = update.password {
                    user.password = Set(password);
                }
                let user = user.update(txn).await?;

                let mut commuter: commuter::ActiveModel = commuter.into();
                commuter.contact_no = Set(optional(update.contact_no));
                commuter.discount_type = Set(Some(discount_type));
                commuter.preferred_route = Set(update.preferred_route);
                let commuter = commuter.update(txn).await?;

                info!("Updated commuter profile {}", commuter.commuter_id);
                Ok(Profile {
                    user,
                    role: RoleProfile::Commuter(commuter),
                })
            })
        })
        .await
}
