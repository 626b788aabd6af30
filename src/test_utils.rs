//! Shared test utilities for the transport ledger.
//!
//! This module provides common helper functions for setting up in-memory databases and
//! creating test users, crews and route networks with sensible defaults.

use crate::{
    core::{
        account::{self, NewRole, NewUser},
        route,
    },
    entities::{fare, route as route_entity, vehicle_assignment},
    errors::Result,
    gateway::Gateway,
};
use chrono::NaiveDateTime;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use tracing_subscriber::EnvFilter;

/// Installs a tracing subscriber that writes through the test harness. Safe to call from
/// every test; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates a gateway over an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_gateway() -> Result<Gateway> {
    Gateway::connect("sqlite::memory:").await
}

/// Counts the rows in `table`, seeing uncommitted rows of an open explicit transaction.
pub async fn count_rows(gateway: &Gateway, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) AS n FROM {table}");
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                let backend = txn.get_database_backend();
                let row = txn.query_one(Statement::from_string(backend, sql)).await?;
                match row {
                    Some(row) => Ok(row.try_get::<i64>("", "n")?),
                    None => Ok(0),
                }
            })
        })
        .await
}

/// Creates the sample network: four priced routes between Antipolo, Cubao and T.I.P.
///
/// Antipolo to T.I.P. is created first (17.7 km, 45.14 / 36.11).
pub async fn seed_sample_network(
    gateway: &Gateway,
) -> Result<Vec<(route_entity::Model, fare::Model)>> {
    let mut priced = Vec::new();
    for (origin, destination, distance, price, discount) in [
        ("Antipolo", "T.I.P.", 17.7, 45.14, 36.11),
        ("T.I.P.", "Antipolo", 17.7, 45.14, 36.11),
        ("Antipolo", "Cubao", 16.4, 42.00, 33.60),
        ("Cubao", "T.I.P.", 5.2, 17.50, 14.00),
    ] {
        let route = route::create_route(gateway, origin, destination, distance).await?;
        let fare = route::configure_fare(gateway, route.route_id, price, discount).await?;
        priced.push((route, fare));
    }
    Ok(priced)
}

fn test_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        first_name: "Test".to_string(),
        last_name: username.to_string(),
        email: None,
        password: "password".to_string(),
    }
}

/// Registers a commuter and returns their commuter id.
///
/// # Arguments
/// * `username` - Unique username
/// * `discount_type` - Profile discount label, `None` for a Regular passenger
pub async fn create_test_commuter(
    gateway: &Gateway,
    username: &str,
    discount_type: Option<&str>,
) -> Result<String> {
    let profile = account::register(
        gateway,
        test_user(username),
        NewRole::Commuter {
            contact_no: None,
            discount_type: discount_type.map(str::to_string),
            preferred_route: None,
        },
    )
    .await?;
    Ok(profile.role.role_id().to_string())
}

/// Role ids of a driver and conductor registered together.
#[derive(Debug, Clone)]
pub struct TestCrew {
    /// Driver role id
    pub driver_id: String,
    /// Conductor role id
    pub conductor_id: String,
}

/// Registers a driver (`driver1`) and a conductor (`conductor1`). No vehicle is created.
pub async fn create_test_crew(gateway: &Gateway) -> Result<TestCrew> {
    let driver = account::register(
        gateway,
        test_user("driver1"),
        NewRole::Driver {
            license_no: Some(1001),
        },
    )
    .await?;
    let conductor = account::register(
        gateway,
        test_user("conductor1"),
        NewRole::Conductor {
            license_no: Some(2001),
        },
    )
    .await?;
    Ok(TestCrew {
        driver_id: driver.role.role_id().to_string(),
        conductor_id: conductor.role.role_id().to_string(),
    })
}

/// Inserts an assignment with an explicit timestamp, bypassing `assign_vehicle`'s clock.
pub async fn insert_assignment_at(
    gateway: &Gateway,
    vehicle_id: &str,
    driver_id: &str,
    conductor_id: &str,
    assigned_at: NaiveDateTime,
) -> Result<()> {
    let assignment = vehicle_assignment::ActiveModel {
        vehicle_id: Set(vehicle_id.to_string()),
        driver_id: Set(driver_id.to_string()),
        conductor_id: Set(conductor_id.to_string()),
        assignment_date: Set(Some(assigned_at)),
        ..Default::default()
    };
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                assignment.insert(txn).await?;
                Ok(())
            })
        })
        .await
}
