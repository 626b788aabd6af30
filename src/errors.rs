//! Unified error type for the transport ledger.
//!
//! Every fallible operation in the crate returns [`Result`]. Storage failures coming out of
//! `SeaORM` are classified on the way in: constraint failures become
//! [`Error::ConstraintViolation`] and lost or unavailable connections become
//! [`Error::Connection`], so callers can tell "no data" apart from "could not ask".

use sea_orm::{DbErr, SqlErr, TransactionError};
use thiserror::Error;

/// Coarse classification of [`Error`] for callers that only need to pick a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced entity does not exist
    NotFound,
    /// The storage engine rejected a write (unique, foreign key, check, not null)
    ConstraintViolation,
    /// The caller supplied a value outside the accepted domain
    InvalidInput,
    /// The conductor has no vehicle assignment to default to
    NoVehicleAssigned,
    /// The database could not be reached
    Connection,
    /// Configuration, transaction misuse, or an unclassified storage failure
    Internal,
}

/// All failures surfaced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced row is missing (commuter, route, vehicle, conductor, fare, ...)
    #[error("{entity} '{id}' not found")]
    ReferenceNotFound {
        /// Entity name, e.g. `"commuter"`
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// No route row matches the origin/destination pair
    #[error("No route from '{origin}' to '{destination}'")]
    RouteNotFound {
        /// Origin label
        origin: String,
        /// Destination label
        destination: String,
    },

    /// The route exists but has no usable fare row
    #[error("Route {route_id} has no fare configured")]
    FareNotConfigured {
        /// Route that lacks a fare
        route_id: i64,
    },

    /// Passenger category outside Regular, Student, Senior, PWD
    #[error("Unknown passenger category '{category}'")]
    InvalidCategory {
        /// The rejected category text
        category: String,
    },

    /// Transaction amount that is zero, negative, or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Feedback that fails validation
    #[error("Invalid feedback: {reason}")]
    InvalidFeedback {
        /// What was wrong with it
        reason: String,
    },

    /// Any other out-of-domain input
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the rejected input
        message: String,
    },

    /// No vehicle could be derived from the conductor's assignments
    #[error("Conductor '{conductor_id}' has no vehicle assigned")]
    NoVehicleAssigned {
        /// Conductor without an assignment
        conductor_id: String,
    },

    /// Uniqueness, foreign key, check, or not-null failure reported by `SQLite`
    #[error("Constraint violation: {message}")]
    ConstraintViolation {
        /// Message reported by the storage engine
        message: String,
    },

    /// The connection could not be opened, acquired, or used
    #[error("Connection error: {message}")]
    Connection {
        /// Message reported by the driver
        message: String,
    },

    /// `begin`/`commit`/`rollback` called out of order
    #[error("Transaction state error: {message}")]
    TransactionState {
        /// What was attempted
        message: String,
    },

    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Storage failure that is neither a constraint nor a connection problem
    #[error("Database error: {0}")]
    Database(DbErr),
}

impl Error {
    /// Shorthand for [`Error::ReferenceNotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::ReferenceNotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Folds the variant into the coarse [`ErrorKind`] taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ReferenceNotFound { .. }
            | Self::RouteNotFound { .. }
            | Self::FareNotConfigured { .. } => ErrorKind::NotFound,
            Self::InvalidCategory { .. }
            | Self::InvalidAmount { .. }
            | Self::InvalidFeedback { .. }
            | Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::NoVehicleAssigned { .. } => ErrorKind::NoVehicleAssigned,
            Self::ConstraintViolation { .. } => ErrorKind::ConstraintViolation,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::TransactionState { .. } | Self::Config { .. } | Self::Database(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                return Self::ConstraintViolation { message };
            }
            Some(SqlErr::ForeignKeyConstraintViolation(message)) => {
                return Self::ConstraintViolation { message };
            }
            _ => {}
        }

        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::Connection {
                message: err.to_string(),
            },
            // CHECK and NOT NULL failures are not classified by sql_err()
            other if other.to_string().contains("constraint failed") => {
                Self::ConstraintViolation {
                    message: other.to_string(),
                }
            }
            other => Self::Database(other),
        }
    }
}

impl From<TransactionError<Self>> for Error {
    fn from(err: TransactionError<Self>) -> Self {
        match err {
            TransactionError::Connection(db_err) => db_err.into(),
            TransactionError::Transaction(err) => err,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_taxonomy() {
        assert_eq!(Error::not_found("commuter", "P9").kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::InvalidAmount { amount: 0.0 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            Error::NoVehicleAssigned {
                conductor_id: "C1".to_string()
            }
            .kind(),
            ErrorKind::NoVehicleAssigned
        );
        assert_eq!(
            Error::from(DbErr::Custom("boom".to_string())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_check_constraint_message_is_classified() {
        let err = Error::from(DbErr::Custom(
            "CHECK constraint failed: rating BETWEEN 0.0 AND 5.0".to_string(),
        ));
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    }

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found("vehicle", "V404");
        assert_eq!(err.to_string(), "vehicle 'V404' not found");
    }
}
