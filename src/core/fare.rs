//! Fare resolution - turns an origin, destination and passenger category into a price.
//!
//! Trips that start and end at the same stop are charged a flat base fare with two tiers
//! (Regular and discounted). Every other trip looks up its route and that route's fare row:
//! Regular passengers pay `price_fare`, Student, Senior and PWD passengers pay
//! `discount_fare`. Resolution is read-only and can be repeated freely.

use crate::{
    entities::{Commuter, Fare, Route, fare, route},
    errors::{Error, Result},
    gateway::Gateway,
};
use sea_orm::{ConnectionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{debug, instrument};

/// Passenger category, which decides between the full and the discounted price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassengerCategory {
    /// Full fare
    Regular,
    /// Discounted fare
    Student,
    /// Discounted fare
    Senior,
    /// Discounted fare (persons with disability)
    #[serde(rename = "PWD")]
    Pwd,
}

impl PassengerCategory {
    /// Whether this category pays the discounted price.
    #[must_use]
    pub const fn is_discounted(self) -> bool {
        !matches!(self, Self::Regular)
    }

    /// Maps a commuter's stored `discount_type` label to a category.
    ///
    /// The profile screen stores `None`, `Student`, `Senior Citizen` or `PWD`; a missing
    /// value means no discount.
    pub fn from_discount_type(label: Option<&str>) -> Result<Self> {
        match label.map(str::trim) {
            None | Some("") => Ok(Self::Regular),
            Some(label) if label.eq_ignore_ascii_case("none") => Ok(Self::Regular),
            Some(label) if label.eq_ignore_ascii_case("senior citizen") => Ok(Self::Senior),
            Some(label) => label.parse(),
        }
    }
}

impl FromStr for PassengerCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        [Self::Regular, Self::Student, Self::Senior, Self::Pwd]
            .into_iter()
            .find(|category| category.to_string().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::InvalidCategory {
                category: s.to_string(),
            })
    }
}

impl fmt::Display for PassengerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Regular => "Regular",
            Self::Student => "Student",
            Self::Senior => "Senior",
            Self::Pwd => "PWD",
        };
        f.write_str(label)
    }
}

/// Flat fares charged when origin and destination are the same stop.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BaseFares {
    /// Flat fare for Regular passengers
    #[serde(default = "default_base_regular")]
    pub base_regular: f64,
    /// Flat fare for every discounted category
    #[serde(default = "default_base_discounted")]
    pub base_discounted: f64,
}

const fn default_base_regular() -> f64 {
    15.0
}

const fn default_base_discounted() -> f64 {
    12.0
}

impl Default for BaseFares {
    fn default() -> Self {
        Self {
            base_regular: default_base_regular(),
            base_discounted: default_base_discounted(),
        }
    }
}

impl BaseFares {
    /// Flat fare for `category`.
    #[must_use]
    pub const fn for_category(&self, category: PassengerCategory) -> f64 {
        if category.is_discounted() {
            self.base_discounted
        } else {
            self.base_regular
        }
    }
}

/// The priced outcome of a trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareQuote {
    /// Origin label as requested
    pub origin: String,
    /// Destination label as requested
    pub destination: String,
    /// Category the price was chosen for
    pub category: PassengerCategory,
    /// Distance in kilometres, zero for self-routes
    pub distance: f64,
    /// Amount to charge
    pub fare: f64,
    /// Route the quote came from, `None` for self-routes
    pub route_id: Option<i64>,
    /// Fare row the quote came from, `None` for self-routes
    pub fare_id: Option<i64>,
}

/// Resolves the distance and fare for a trip.
///
/// # Arguments
/// * `base` - Flat fares used when `origin` and `destination` are the same stop
/// * `origin` - Boarding stop
/// * `destination` - Alighting stop
/// * `category` - Passenger category ("Regular", "Student", "Senior" or "PWD")
///
/// # Errors
/// * `Error::InvalidCategory` - `category` is not Regular, Student, Senior or PWD
/// * `Error::RouteNotFound` - no route matches `(origin, destination)`
/// * `Error::FareNotConfigured` - the route has no fare, or no discounted price when one is needed
#[instrument(skip(gateway))]
pub async fn resolve_fare(
    gateway: &Gateway,
    base: &BaseFares,
    origin: &str,
    destination: &str,
    category: &str,
) -> Result<FareQuote> {
    let category: PassengerCategory = category.parse()?;
    let base = *base;
    let origin = origin.to_string();
    let destination = destination.to_string();
    gateway
        .atomic(move |txn| {
            Box::pin(async move { resolve_with(txn, &base, &origin, &destination, category).await })
        })
        .await
}

/// Resolves a trip for a registered commuter, using the discount on their profile.
///
/// # Arguments
/// * `base` - Flat fares for self-routes
/// * `commuter_id` - Commuter whose discount type picks the category
/// * `origin` - Boarding stop
/// * `destination` - Alighting stop
#[instrument(skip(gateway))]
pub async fn quote_for_commuter(
    gateway: &Gateway,
    base: &BaseFares,
    commuter_id: &str,
    origin: &str,
    destination: &str,
) -> Result<FareQuote> {
    let base = *base;
    let commuter_id = commuter_id.to_string();
    let origin = origin.to_string();
    let destination = destination.to_string();
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                let commuter = Commuter::find_by_id(commuter_id.clone())
                    .one(txn)
                    .await?
                    .ok_or_else(|| Error::not_found("commuter", &commuter_id))?;
                let category =
                    PassengerCategory::from_discount_type(commuter.discount_type.as_deref())?;
                resolve_with(txn, &base, &origin, &destination, category).await
            })
        })
        .await
}

/// Resolution on an existing connection or transaction.
pub async fn resolve_with<C: ConnectionTrait>(
    db: &C,
    base: &BaseFares,
    origin: &str,
    destination: &str,
    category: PassengerCategory,
) -> Result<FareQuote> {
    let (origin, destination) = (origin.trim(), destination.trim());

    if origin == destination {
        debug!("Self-route {origin}, charging base fare");
        return Ok(FareQuote {
            origin: origin.to_string(),
            destination: destination.to_string(),
            category,
            distance: 0.0,
            fare: base.for_category(category),
            route_id: None,
            fare_id: None,
        });
    }

    let route = find_route(db, origin, destination)
        .await?
        .ok_or_else(|| Error::RouteNotFound {
            origin: origin.to_string(),
            destination: destination.to_string(),
        })?;

    let fare = Fare::find()
        .filter(fare::Column::RouteId.eq(route.route_id))
        .one(db)
        .await?
        .ok_or(Error::FareNotConfigured {
            route_id: route.route_id,
        })?;

    let amount = price_for(&fare, category).ok_or(Error::FareNotConfigured {
        route_id: route.route_id,
    })?;

    Ok(FareQuote {
        origin: origin.to_string(),
        destination: destination.to_string(),
        category,
        distance: route.distance,
        fare: amount,
        route_id: Some(route.route_id),
        fare_id: Some(fare.fare_id),
    })
}

/// Picks the price a passenger of `category` pays under `fare`.
#[must_use]
pub const fn price_for(fare: &fare::Model, category: PassengerCategory) -> Option<f64> {
    if category.is_discounted() {
        fare.discount_fare
    } else {
        Some(fare.price_fare)
    }
}

pub(crate) async fn find_route<C: ConnectionTrait>(
    db: &C,
    origin: &str,
    destination: &str,
) -> Result<Option<route::Model>> {
    Route::find()
        .filter(route::Column::Origin.eq(origin))
        .filter(route::Column::Destination.eq(destination))
        .one(db)
        .await
        .map_err(Into::into)
}
