//! Vehicles and crew assignments.
//!
//! Assignments are append-only. A crew member's current vehicle is derived on every call from
//! their most recent assignment row (latest `assignment_date`, ties broken by the highest
//! `assignment_id`); it is never stored.

use crate::{
    entities::{
        Conductor, Driver, Vehicle, VehicleAssignment, vehicle, vehicle_assignment,
    },
    errors::{Error, Result},
    gateway::Gateway,
};
use chrono::Utc;
use sea_orm::{
    ConnectionTrait, QueryOrder, Set,
    prelude::*,
    sea_query::{Expr, Func},
};
use tracing::{info, instrument};

/// Registers a vehicle. Plate numbers are unique; a duplicate is a constraint violation.
#[instrument(skip(gateway))]
pub async fn register_vehicle(
    gateway: &Gateway,
    vehicle_id: &str,
    plate_no: &str,
) -> Result<vehicle::Model> {
    let vehicle_id = vehicle_id.trim().to_string();
    let plate_no = plate_no.trim().to_string();
    if vehicle_id.is_empty() || plate_no.is_empty() {
        return Err(Error::InvalidInput {
            message: "Vehicle id and plate number cannot be empty".to_string(),
        });
    }

    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                let vehicle = vehicle::ActiveModel {
                    vehicle_id: Set(vehicle_id),
                    plate_no: Set(plate_no),
                }
                .insert(txn)
                .await?;
                info!("Registered vehicle {} ({})", vehicle.vehicle_id, vehicle.plate_no);
                Ok(vehicle)
            })
        })
        .await
}

/// Looks a vehicle up by plate number, ignoring case and surrounding whitespace.
pub async fn find_vehicle_by_plate(
    gateway: &Gateway,
    plate_no: &str,
) -> Result<Option<vehicle::Model>> {
    let plate = plate_no.trim().to_lowercase();
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                Vehicle::find()
                    .filter(
                        Expr::expr(Func::lower(Expr::col(vehicle::Column::PlateNo))).eq(plate),
                    )
                    .one(txn)
                    .await
                    .map_err(Into::into)
            })
        })
        .await
}

/// Appends an assignment of `vehicle_id` to a driver and a conductor, stamped with the
/// current time. All three must exist.
///
/// # Arguments
/// * `vehicle_id` - Vehicle being assigned
/// * `driver_id` - Driver taking the vehicle
/// * `conductor_id` - Conductor taking the vehicle
#[instrument(skip(gateway))]
pub async fn assign_vehicle(
    gateway: &Gateway,
    vehicle_id: &str,
    driver_id: &str,
    conductor_id: &str,
) -> Result<vehicle_assignment::Model> {
    let vehicle_id = vehicle_id.to_string();
    let driver_id = driver_id.to_string();
    let conductor_id = conductor_id.to_string();
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                Vehicle::find_by_id(vehicle_id.clone())
                    .one(txn)
                    .await?
                    .ok_or_else(|| Error::not_found("vehicle", &vehicle_id))?;
                Driver::find_by_id(driver_id.clone())
                    .one(txn)
                    .await?
                    .ok_or_else(|| Error::not_found("driver", &driver_id))?;
                Conductor::find_by_id(conductor_id.clone())
                    .one(txn)
                    .await?
                    .ok_or_else(|| Error::not_found("conductor", &conductor_id))?;

                let assignment = vehicle_assignment::ActiveModel {
                    vehicle_id: Set(vehicle_id),
                    driver_id: Set(driver_id),
                    conductor_id: Set(conductor_id),
                    assignment_date: Set(Some(Utc::now().naive_utc())),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                info!(
                    "Assigned vehicle {} to driver {} and conductor {}",
                    assignment.vehicle_id, assignment.driver_id, assignment.conductor_id
                );
                Ok(assignment)
            })
        })
        .await
}

/// The vehicle a conductor is currently assigned to, if any.
pub async fn current_vehicle_for_conductor(
    gateway: &Gateway,
    conductor_id: &str,
) -> Result<Option<vehicle::Model>> {
    let conductor_id = conductor_id.to_string();
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                current_vehicle(
                    txn,
                    vehicle_assignment::Column::ConductorId,
                    &conductor_id,
                )
                .await
            })
        })
        .await
}

/// The vehicle a driver is currently assigned to, if any.
pub async fn current_vehicle_for_driver(
    gateway: &Gateway,
    driver_id: &str,
) -> Result<Option<vehicle::Model>> {
    let driver_id = driver_id.to_string();
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                current_vehicle(txn, vehicle_assignment::Column::DriverId, &driver_id).await
            })
        })
        .await
}

/// Latest assignment row where `crew_column` equals `crew_id`, resolved to its vehicle.
pub(crate) async fn current_vehicle<C: ConnectionTrait>(
    db: &C,
    crew_column: vehicle_assignment::Column,
    crew_id: &str,
) -> Result<Option<vehicle::Model>> {
    let latest = VehicleAssignment::find()
        .filter(crew_column.eq(crew_id))
        .order_by_desc(vehicle_assignment::Column::AssignmentDate)
        .order_by_desc(vehicle_assignment::Column::AssignmentId)
        .one(db)
        .await?;

    match latest {
        Some(assignment) => Vehicle::find_by_id(assignment.vehicle_id)
            .one(db)
            .await
            .map_err(Into::into),
        None => Ok(None),
    }
}
