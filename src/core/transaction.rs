//! Transaction recorder - appends the fare a conductor collected on board.
//!
//! Recording validates the amount before touching the database, then checks every referenced
//! row inside one atomic unit so a rejected transaction leaves nothing behind. When no vehicle
//! is given the conductor's current assignment supplies it. Transactions are immutable: there
//! is no update or delete path.

use crate::{
    core::assignment::current_vehicle,
    entities::{
        Commuter, Conductor, Fare, Route, Transaction, Vehicle, route, transaction, vehicle,
        vehicle_assignment,
    },
    errors::{Error, Result},
    gateway::Gateway,
};
use chrono::Utc;
use sea_orm::{
    ConnectionTrait, FromQueryResult, QueryOrder, QuerySelect, Set, Statement, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Everything needed to record one fare collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTransaction {
    /// Paying commuter
    pub commuter_id: String,
    /// Route travelled
    pub route_id: i64,
    /// Vehicle boarded; `None` uses the conductor's current vehicle
    pub vehicle_id: Option<String>,
    /// Conductor collecting the fare
    pub conductor_id: String,
    /// Fare row the amount was taken from
    pub fare_id: i64,
    /// Amount collected
    pub amount: f64,
}

/// Records a transaction and returns its id.
///
/// Ids are `T<n>`, one past the highest numbered id already stored; ids entered by hand that
/// do not follow the pattern are skipped over.
///
/// # Arguments
/// * `gateway` - Connection to record through
/// * `new` - Commuter, route, fare and crew for the trip, plus the amount collected
///
/// # Errors
/// * `Error::InvalidAmount` - the amount is zero, negative, or not finite
/// * `Error::ReferenceNotFound` - the commuter, route, vehicle, conductor or fare does not exist
/// * `Error::InvalidInput` - the fare belongs to a different route
/// * `Error::NoVehicleAssigned` - no vehicle was given and the conductor has no assignment
#[instrument(skip(gateway))]
pub async fn record_transaction(gateway: &Gateway, new: NewTransaction) -> Result<String> {
    if !new.amount.is_finite() || new.amount <= 0.0 {
        return Err(Error::InvalidAmount { amount: new.amount });
    }

    gateway
        .atomic(move |txn| Box::pin(async move { insert_transaction(txn, new).await }))
        .await
}

async fn insert_transaction<C: ConnectionTrait>(db: &C, new: NewTransaction) -> Result<String> {
    Commuter::find_by_id(new.commuter_id.clone())
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("commuter", &new.commuter_id))?;
    Route::find_by_id(new.route_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("route", new.route_id))?;
    Conductor::find_by_id(new.conductor_id.clone())
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("conductor", &new.conductor_id))?;

    let vehicle_id = match new.vehicle_id {
        Some(vehicle_id) => {
            Vehicle::find_by_id(vehicle_id.clone())
                .one(db)
                .await?
                .ok_or_else(|| Error::not_found("vehicle", &vehicle_id))?;
            vehicle_id
        }
        None => {
            let vehicle = current_vehicle(
                db,
                vehicle_assignment::Column::ConductorId,
                &new.conductor_id,
            )
            .await?
            .ok_or_else(|| Error::NoVehicleAssigned {
                conductor_id: new.conductor_id.clone(),
            })?;
            debug!(
                "Defaulted to vehicle {} for conductor {}",
                vehicle.vehicle_id, new.conductor_id
            );
            vehicle.vehicle_id
        }
    };

    let fare = Fare::find_by_id(new.fare_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("fare", new.fare_id))?;
    if fare.route_id != Some(new.route_id) {
        return Err(Error::InvalidInput {
            message: format!(
                "Fare {} does not belong to route {}",
                new.fare_id, new.route_id
            ),
        });
    }

    let transaction_id = next_transaction_id(db).await?;
    let model = transaction::ActiveModel {
        transaction_id: Set(transaction_id.clone()),
        commuter_id: Set(Some(new.commuter_id)),
        route_id: Set(Some(new.route_id)),
        vehicle_id: Set(Some(vehicle_id)),
        conductor_id: Set(Some(new.conductor_id)),
        fare_id: Set(Some(new.fare_id)),
        total_fare: Set(new.amount),
        transaction_date: Set(Some(Utc::now().naive_utc())),
    };
    Transaction::insert(model).exec_without_returning(db).await?;

    info!("Recorded transaction {} for {:.2}", transaction_id, new.amount);
    Ok(transaction_id)
}

/// Ids are `T` followed by one more than the highest numbered `T<n>` id already stored.
/// Rows entered by hand may use other ids, so the candidate is checked before use.
async fn next_transaction_id<C: ConnectionTrait>(db: &C) -> Result<String> {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT COALESCE(MAX(CAST(SUBSTR(transaction_id, 2) AS INTEGER)), 0) + 1 AS next_id \
             FROM transactions WHERE transaction_id GLOB 'T[0-9]*'",
        ))
        .await?;
    let mut next: i64 = match row {
        Some(row) => row.try_get("", "next_id")?,
        None => 1,
    };
    loop {
        let candidate = format!("T{next}");
        if Transaction::find_by_id(candidate.clone()).one(db).await?.is_none() {
            return Ok(candidate);
        }
        debug!("Transaction id {candidate} already taken");
        next += 1;
    }
}

/// Looks a transaction up by id.
pub async fn get_transaction(
    gateway: &Gateway,
    transaction_id: &str,
) -> Result<Option<transaction::Model>> {
    let transaction_id = transaction_id.to_string();
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                Transaction::find_by_id(transaction_id)
                    .one(txn)
                    .await
                    .map_err(Into::into)
            })
        })
        .await
}

/// A transaction joined to its route labels and vehicle plate, as the history screens show it.
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct TransactionListing {
    /// Transaction id
    pub transaction_id: String,
    /// Paying commuter
    pub commuter_id: Option<String>,
    /// Route travelled
    pub route_id: Option<i64>,
    /// Route origin, `None` if the route is gone
    pub origin: Option<String>,
    /// Route destination
    pub destination: Option<String>,
    /// Vehicle boarded
    pub vehicle_id: Option<String>,
    /// Plate of the vehicle boarded
    pub plate_no: Option<String>,
    /// Conductor who collected the fare
    pub conductor_id: Option<String>,
    /// Fare row used
    pub fare_id: Option<i64>,
    /// Amount collected
    pub total_fare: f64,
    /// When it was recorded
    pub transaction_date: Option<DateTime>,
}

/// A commuter's transactions, newest first.
pub async fn transactions_for_commuter(
    gateway: &Gateway,
    commuter_id: &str,
) -> Result<Vec<TransactionListing>> {
    newest_first(gateway, transaction::Column::CommuterId, commuter_id).await
}

/// Transactions a conductor collected, newest first.
pub async fn transactions_for_conductor(
    gateway: &Gateway,
    conductor_id: &str,
) -> Result<Vec<TransactionListing>> {
    newest_first(gateway, transaction::Column::ConductorId, conductor_id).await
}

async fn newest_first(
    gateway: &Gateway,
    column: transaction::Column,
    id: &str,
) -> Result<Vec<TransactionListing>> {
    let id = id.to_string();
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                Transaction::find()
                    .select_only()
                    .columns([
                        transaction::Column::TransactionId,
                        transaction::Column::CommuterId,
                        transaction::Column::RouteId,
                        transaction::Column::VehicleId,
                        transaction::Column::ConductorId,
                        transaction::Column::FareId,
                        transaction::Column::TotalFare,
                        transaction::Column::TransactionDate,
                    ])
                    .column_as(route::Column::Origin, "origin")
                    .column_as(route::Column::Destination, "destination")
                    .column_as(vehicle::Column::PlateNo, "plate_no")
                    .left_join(Route)
                    .left_join(Vehicle)
                    .filter(column.eq(id))
                    .order_by_desc(transaction::Column::TransactionDate)
                    .order_by_desc(Expr::cust("transactions.rowid"))
                    .into_model::<TransactionListing>()
                    .all(txn)
                    .await
                    .map_err(Into::into)
            })
        })
        .await
}
