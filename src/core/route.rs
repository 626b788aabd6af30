//! Route and fare catalogue.
//!
//! Creating routes, pricing them, and the read-only listings the role screens show
//! (route labels, origin/destination pickers, the fare table joined to its routes).

use crate::{
    entities::{Fare, Route, RouteView, fare, route, route_view},
    errors::{Error, Result},
    gateway::Gateway,
};
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// One row of the fare table, joined to its route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareListing {
    /// Fare id
    pub fare_id: i64,
    /// Route id
    pub route_id: i64,
    /// Route origin
    pub origin: String,
    /// Route destination
    pub destination: String,
    /// Route distance in kilometres
    pub distance: f64,
    /// Full price
    pub price_fare: f64,
    /// Discounted price
    pub discount_fare: Option<f64>,
}

/// Creates a route after validating its labels and distance.
///
/// Labels are trimmed and must be non-empty, the distance must be finite and non-negative,
/// and a route from a stop to itself must have distance zero. A second route with the same
/// origin and destination is rejected as a constraint violation.
///
/// # Arguments
/// * `origin` - Starting stop label
/// * `destination` - Ending stop label
/// * `distance` - Length of the route in kilometres
#[instrument(skip(gateway))]
pub async fn create_route(
    gateway: &Gateway,
    origin: &str,
    destination: &str,
    distance: f64,
) -> Result<route::Model> {
    let origin = origin.to_string();
    let destination = destination.to_string();
    gateway
        .atomic(move |txn| {
            Box::pin(async move { insert_route(txn, &origin, &destination, distance).await })
        })
        .await
}

/// Attaches a fare to a route. Prices must be finite and non-negative, and the discounted
/// price may not exceed the full price.
#[instrument(skip(gateway))]
pub async fn configure_fare(
    gateway: &Gateway,
    route_id: i64,
    price_fare: f64,
    discount_fare: f64,
) -> Result<fare::Model> {
    gateway
        .atomic(move |txn| {
            Box::pin(async move { insert_fare(txn, route_id, price_fare, discount_fare).await })
        })
        .await
}

pub(crate) async fn insert_route<C: ConnectionTrait>(
    db: &C,
    origin: &str,
    destination: &str,
    distance: f64,
) -> Result<route::Model> {
    let (origin, destination) = (origin.trim(), destination.trim());
    if origin.is_empty() || destination.is_empty() {
        return Err(Error::InvalidInput {
            message: "Route origin and destination cannot be empty".to_string(),
        });
    }
    if !distance.is_finite() || distance < 0.0 {
        return Err(Error::InvalidInput {
            message: format!("Route distance must be a non-negative number, got {distance}"),
        });
    }
    if origin == destination && distance != 0.0 {
        return Err(Error::InvalidInput {
            message: format!("Self-route {origin} must have distance 0"),
        });
    }
    if crate::core::fare::find_route(db, origin, destination)
        .await?
        .is_some()
    {
        return Err(Error::ConstraintViolation {
            message: format!("Route {origin} to {destination} already exists"),
        });
    }

    let route = route::ActiveModel {
        origin: Set(origin.to_string()),
        destination: Set(destination.to_string()),
        distance: Set(distance),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(
        "Created route {} ({} to {}, {} km)",
        route.route_id, route.origin, route.destination, route.distance
    );
    Ok(route)
}

pub(crate) async fn insert_fare<C: ConnectionTrait>(
    db: &C,
    route_id: i64,
    price_fare: f64,
    discount_fare: f64,
) -> Result<fare::Model> {
    for price in [price_fare, discount_fare] {
        if !price.is_finite() || price < 0.0 {
            return Err(Error::InvalidInput {
                message: format!("Fare prices must be non-negative numbers, got {price}"),
            });
        }
    }
    if discount_fare > price_fare {
        return Err(Error::InvalidInput {
            message: format!(
                "Discounted price {discount_fare:.2} exceeds full price {price_fare:.2}"
            ),
        });
    }

    Route::find_by_id(route_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("route", route_id))?;
    let existing = Fare::find()
        .filter(fare::Column::RouteId.eq(route_id))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(Error::ConstraintViolation {
            message: format!("Route {route_id} already has a fare"),
        });
    }

    let fare = fare::ActiveModel {
        route_id: Set(Some(route_id)),
        price_fare: Set(price_fare),
        discount_fare: Set(Some(discount_fare)),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(
        "Configured fare {} for route {}: {:.2} / {:.2}",
        fare.fare_id, route_id, price_fare, discount_fare
    );
    Ok(fare)
}

/// All routes, ordered by id.
pub async fn list_routes(gateway: &Gateway) -> Result<Vec<route::Model>> {
    gateway
        .atomic(|txn| {
            Box::pin(async move {
                Route::find()
                    .order_by_asc(route::Column::RouteId)
                    .all(txn)
                    .await
                    .map_err(Into::into)
            })
        })
        .await
}

/// Display labels (`"<origin> to <destination>"`) from `route_view`, ordered by route id.
pub async fn route_labels(gateway: &Gateway) -> Result<Vec<route_view::Model>> {
    gateway
        .atomic(|txn| {
            Box::pin(async move {
                RouteView::find()
                    .order_by_asc(route_view::Column::RouteId)
                    .all(txn)
                    .await
                    .map_err(Into::into)
            })
        })
        .await
}

/// Distinct origins, alphabetically.
pub async fn list_origins(gateway: &Gateway) -> Result<Vec<String>> {
    distinct_labels(gateway, route::Column::Origin).await
}

/// Distinct destinations, alphabetically.
pub async fn list_destinations(gateway: &Gateway) -> Result<Vec<String>> {
    distinct_labels(gateway, route::Column::Destination).await
}

async fn distinct_labels(gateway: &Gateway, column: route::Column) -> Result<Vec<String>> {
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                Route::find()
                    .select_only()
                    .column(column)
                    .distinct()
                    .order_by_asc(column)
                    .into_tuple::<String>()
                    .all(txn)
                    .await
                    .map_err(Into::into)
            })
        })
        .await
}

/// The fare table joined to routes, ordered by fare id. Fares whose route is missing are
/// left out.
pub async fn list_fares_with_routes(gateway: &Gateway) -> Result<Vec<FareListing>> {
    let rows = gateway
        .atomic(|txn| {
            Box::pin(async move {
                Fare::find()
                    .find_also_related(Route)
                    .order_by_asc(fare::Column::FareId)
                    .all(txn)
                    .await
                    .map_err(Error::from)
            })
        })
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(fare, route)| {
            route.map(|route| FareListing {
                fare_id: fare.fare_id,
                route_id: route.route_id,
                origin: route.origin,
                destination: route.destination,
                distance: route.distance,
                price_fare: fare.price_fare,
                discount_fare: fare.discount_fare,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_route_validation() -> Result<()> {
        let gateway = setup_test_gateway().await?;

        assert!(matches!(
            create_route(&gateway, "  ", "Cubao", 3.0).await,
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            create_route(&gateway, "Cubao", "Antipolo", -1.0).await,
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            create_route(&gateway, "Cubao", "Antipolo", f64::NAN).await,
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            create_route(&gateway, "Cubao", "Cubao", 2.0).await,
            Err(Error::InvalidInput { .. })
        ));

        let self_route = create_route(&gateway, "Cubao", "Cubao", 0.0).await?;
        assert_eq!(self_route.distance, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_route_rejected() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        create_route(&gateway, "Antipolo", "Cubao", 16.4).await?;
        let result = create_route(&gateway, " Antipolo ", "Cubao", 16.4).await;
        assert!(matches!(result, Err(Error::ConstraintViolation { .. })));

        // The reverse direction is a different route
        create_route(&gateway, "Cubao", "Antipolo", 16.4).await?;
        assert_eq!(list_routes(&gateway).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_configure_fare_enforces_discount_ceiling() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        let route = create_route(&gateway, "Antipolo", "Cubao", 16.4).await?;

        let result = configure_fare(&gateway, route.route_id, 40.0, 41.0).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        let result = configure_fare(&gateway, route.route_id, -1.0, -2.0).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let fare = configure_fare(&gateway, route.route_id, 40.0, 40.0).await?;
        assert_eq!(fare.route_id, Some(route.route_id));
        assert_eq!(fare.discount_fare, Some(40.0));

        let again = configure_fare(&gateway, route.route_id, 42.0, 33.6).await;
        assert!(matches!(again, Err(Error::ConstraintViolation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_configure_fare_unknown_route() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        let result = configure_fare(&gateway, 77, 10.0, 8.0).await;
        assert!(matches!(
            result,
            Err(Error::ReferenceNotFound { entity: "route", .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_route_labels_from_view() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        seed_sample_network(&gateway).await?;

        let labels = route_labels(&gateway).await?;
        let routes = list_routes(&gateway).await?;
        assert_eq!(labels.len(), routes.len());
        assert_eq!(labels[0].route_id, routes[0].route_id);
        assert_eq!(labels[0].origin_to_destination, "Antipolo to T.I.P.");
        Ok(())
    }

    #[tokio::test]
    async fn test_origin_and_destination_pickers() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        seed_sample_network(&gateway).await?;

        let origins = list_origins(&gateway).await?;
        let destinations = list_destinations(&gateway).await?;
        assert_eq!(origins, vec!["Antipolo", "Cubao", "T.I.P."]);
        assert_eq!(destinations, vec!["Antipolo", "Cubao", "T.I.P."]);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_fares_with_routes() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        seed_sample_network(&gateway).await?;
        // A priced route plus one without a fare
        create_route(&gateway, "Marikina", "Cainta", 6.2).await?;

        let fares = list_fares_with_routes(&gateway).await?;
        assert_eq!(fares.len(), 4);
        let first = &fares[0];
        assert_eq!(first.origin, "Antipolo");
        assert_eq!(first.destination, "T.I.P.");
        assert_eq!(first.distance, 17.7);
        assert_eq!(first.price_fare, 45.14);
        assert_eq!(first.discount_fare, Some(36.11));
        assert!(fares.iter().all(|f| f.origin != "Marikina"));
        Ok(())
    }
}
