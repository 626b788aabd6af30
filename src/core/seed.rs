//! Seeds the route network from configuration.
//!
//! Seeding only runs against an empty `routes` table, so restarting against an existing
//! database never duplicates or overwrites routes an operator has edited since.

use crate::{
    config::network::Config,
    core::route::{insert_fare, insert_route},
    entities::Route,
    errors::Result,
    gateway::Gateway,
};
use sea_orm::{PaginatorTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Inserts every configured route with its fare and returns how many were added.
///
/// Returns `0` without writing when routes already exist. A bad entry aborts the whole seed.
#[instrument(skip_all, fields(configured = config.routes.len()))]
pub async fn seed_network(gateway: &Gateway, config: &Config) -> Result<usize> {
    let routes = config.routes.clone();
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                let existing = Route::find().count(txn).await?;
                if existing > 0 {
                    info!("Found {existing} routes, skipping network seed");
                    return Ok(0);
                }

                for entry in &routes {
                    let route =
                        insert_route(txn, &entry.origin, &entry.destination, entry.distance)
                            .await?;
                    insert_fare(txn, route.route_id, entry.price, entry.discount).await?;
                    debug!("Seeded {} to {}", route.origin, route.destination);
                }
                info!("Seeded {} routes", routes.len());
                Ok(routes.len())
            })
        })
        .await
}
