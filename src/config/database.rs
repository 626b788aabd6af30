//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation. The schema is written out
//! as plain DDL rather than generated from the entities: the column names, `CHECK` clauses
//! and foreign keys must match existing `transport_app.db` files exactly, and the
//! `route_view` view has no entity-level equivalent.

use crate::errors::{Error, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::{debug, info, instrument};

/// Database file used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://transport_app.db?mode=rwc";

/// Pragmas applied once per connection at connect time.
const CONNECTION_PRAGMAS: [&str; 2] = ["PRAGMA foreign_keys = ON", "PRAGMA journal_mode = WAL"];

/// Table and view definitions, in creation order.
const SCHEMA: [&str; 12] = [
    "CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY AUTOINCREMENT,
        username VARCHAR UNIQUE NOT NULL,
        first_name VARCHAR NOT NULL,
        last_name VARCHAR NOT NULL,
        email VARCHAR UNIQUE,
        password VARCHAR NOT NULL,
        user_type VARCHAR NOT NULL CHECK(user_type IN ('Admin', 'Commuter', 'Driver', 'Conductor'))
    )",
    "CREATE TABLE IF NOT EXISTS admins (
        admin_id VARCHAR PRIMARY KEY,
        user_id INTEGER UNIQUE,
        role VARCHAR,
        FOREIGN KEY (user_id) REFERENCES users(user_id)
    )",
    "CREATE TABLE IF NOT EXISTS drivers (
        driver_id VARCHAR PRIMARY KEY,
        user_id INTEGER UNIQUE NOT NULL,
        license_no INTEGER,
        FOREIGN KEY(user_id) REFERENCES users(user_id)
    )",
    "CREATE TABLE IF NOT EXISTS commuters (
        commuter_id VARCHAR PRIMARY KEY,
        user_id INTEGER NOT NULL,
        contact_no TEXT,
        discount_type TEXT DEFAULT 'None',
        preferred_route INTEGER,
        FOREIGN KEY(user_id) REFERENCES users(user_id),
        FOREIGN KEY(preferred_route) REFERENCES routes(route_id)
    )",
    "CREATE TABLE IF NOT EXISTS conductors (
        conductor_id VARCHAR PRIMARY KEY,
        user_id INTEGER UNIQUE NOT NULL,
        license_no INTEGER,
        FOREIGN KEY(user_id) REFERENCES users(user_id)
    )",
    "CREATE TABLE IF NOT EXISTS vehicles (
        vehicle_id VARCHAR PRIMARY KEY,
        plate_no VARCHAR UNIQUE NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS routes (
        route_id INTEGER PRIMARY KEY AUTOINCREMENT,
        origin VARCHAR NOT NULL,
        destination VARCHAR NOT NULL,
        distance REAL NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS fares (
        fare_id INTEGER PRIMARY KEY AUTOINCREMENT,
        route_id INTEGER,
        price_fare REAL NOT NULL,
        discount_fare REAL,
        FOREIGN KEY (route_id) REFERENCES routes(route_id)
    )",
    "CREATE TABLE IF NOT EXISTS transactions (
        transaction_id VARCHAR PRIMARY KEY,
        commuter_id VARCHAR,
        route_id INTEGER,
        vehicle_id VARCHAR,
        conductor_id VARCHAR,
        fare_id INTEGER,
        total_fare REAL NOT NULL,
        transaction_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (commuter_id) REFERENCES commuters(commuter_id),
        FOREIGN KEY (route_id) REFERENCES routes(route_id),
        FOREIGN KEY (vehicle_id) REFERENCES vehicles(vehicle_id),
        FOREIGN KEY (conductor_id) REFERENCES conductors(conductor_id),
        FOREIGN KEY (fare_id) REFERENCES fares(fare_id)
    )",
    "CREATE TABLE IF NOT EXISTS feedbacks (
        feedback_id INTEGER PRIMARY KEY AUTOINCREMENT,
        commuter_id VARCHAR,
        driver_id VARCHAR,
        conductor_id VARCHAR,
        rating REAL CHECK(rating BETWEEN 0.0 AND 5.0),
        comment TEXT,
        FOREIGN KEY (commuter_id) REFERENCES commuters(commuter_id),
        FOREIGN KEY (driver_id) REFERENCES drivers(driver_id),
        FOREIGN KEY (conductor_id) REFERENCES conductors(conductor_id)
    )",
    "CREATE TABLE IF NOT EXISTS vehicle_assignment (
        assignment_id INTEGER PRIMARY KEY AUTOINCREMENT,
        vehicle_id VARCHAR NOT NULL,
        driver_id VARCHAR NOT NULL,
        conductor_id VARCHAR NOT NULL,
        assignment_date DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(vehicle_id) REFERENCES vehicles(vehicle_id),
        FOREIGN KEY(driver_id) REFERENCES drivers(driver_id),
        FOREIGN KEY(conductor_id) REFERENCES conductors(conductor_id)
    )",
    "CREATE VIEW IF NOT EXISTS route_view AS
    SELECT
        route_id,
        origin || ' to ' || destination AS origin_to_destination
    FROM routes",
];

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back to
/// [`DEFAULT_DATABASE_URL`].
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Whether `SeaORM` should log every statement, read from `SQL_LOGGING` (`1`/`true`).
#[must_use]
pub fn sql_logging_enabled() -> bool {
    std::env::var("SQL_LOGGING")
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true"))
        .unwrap_or(false)
}

/// Opens the single connection used by the process and applies the connection pragmas.
///
/// The pool is capped at one connection so every statement in the process goes through the
/// same `SQLite` handle; this is also what keeps `sqlite::memory:` databases coherent.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Opening database connection to: {}", database_url);
    let mut options = ConnectOptions::new(database_url.to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(sql_logging_enabled());

    let db = Database::connect(options).await.map_err(|e| Error::Connection {
        message: format!("Failed to open database at {database_url}: {e}"),
    })?;

    for pragma in CONNECTION_PRAGMAS {
        db.execute_unprepared(pragma).await?;
    }
    info!("Database connection opened with foreign keys and WAL journal enabled.");
    Ok(db)
}

/// Creates all tables and the `route_view` view if they do not exist yet.
#[instrument(skip(db))]
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    debug!("Executing CREATE TABLE statements if tables do not exist.");
    for statement in SCHEMA {
        db.execute_unprepared(statement).await?;
    }
    info!("Database tables ensured.");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    use super::*;
    use crate::entities::{Fare, Route, RouteView, Transaction, User, VehicleAssignment};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _ = User::find().limit(1).all(&db).await?;
        let _ = Route::find().limit(1).all(&db).await?;
        let _ = Fare::find().limit(1).all(&db).await?;
        let _ = Transaction::find().limit(1).all(&db).await?;
        let _ = VehicleAssignment::find().limit(1).all(&db).await?;
        let _ = RouteView::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        let result = db
            .execute_unprepared("INSERT INTO fares (route_id, price_fare) VALUES (999, 10.0)")
            .await;
        let err = Error::from(result.expect_err("dangling route_id should be rejected"));
        assert!(matches!(err, Error::ConstraintViolation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_database_is_connection_error() {
        let result = create_connection("sqlite:///nonexistent-dir/for/sure/ledger.db").await;
        assert!(matches!(result, Err(Error::Connection { .. })));
    }
}
