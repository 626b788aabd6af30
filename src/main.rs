use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use transport_ledger::{
    config::{database, network},
    core::{route, seed},
    errors::Result,
    gateway::Gateway,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load base fares and the route network
    let config = network::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(
        "Loaded configuration: base fares {:.2} / {:.2}, {} configured routes",
        config.fares.base_regular,
        config.fares.base_discounted,
        config.routes.len()
    );

    // 4. Open the database and ensure the schema
    let database_url = database::get_database_url();
    let gateway = Gateway::connect(&database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Seed the route network into an empty database
    seed::seed_network(&gateway, &config)
        .await
        .inspect(|added| info!("Route network seeded ({} routes added).", added))
        .inspect_err(|e| error!("Failed to seed route network: {}", e))?;

    // 6. Report what is available
    let fares = route::list_fares_with_routes(&gateway).await?;
    info!("{} priced routes available.", fares.len());
    for listing in &fares {
        info!(
            "  {} to {}: {:.1} km, {:.2} / {:.2}",
            listing.origin,
            listing.destination,
            listing.distance,
            listing.price_fare,
            listing.discount_fare.unwrap_or(listing.price_fare)
        );
    }

    gateway.close().await
}
