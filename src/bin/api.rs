use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use food_orders::api::{self, AppState};
use food_orders::cache::{ListingCache, RedisListingCache};
use food_orders::config::AppConfig;
use food_orders::metrics::Metrics;
use food_orders::repository::OrderRepository;
use food_orders::store::PgOrderStore;
use food_orders::utils::wait_for_ready;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,food_orders=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order API");

    let config = AppConfig::from_env();

    // === 1. Wait for the database and prepare the schema ===
    let store = wait_for_ready("database", &config.readiness, || {
        PgOrderStore::connect(&config.database)
    })
    .await?;
    store.init_schema().await?;
    let store = Arc::new(store);

    // === 2. Wait for the cache ===
    let cache = Arc::new(RedisListingCache::new(&config.cache)?);
    wait_for_ready("redis", &config.readiness, || cache.ping()).await?;

    // === 3. Metrics and repository ===
    let metrics = Arc::new(Metrics::new()?);
    let repository = Arc::new(OrderRepository::new(
        store.clone(),
        cache.clone(),
        &config.cache,
        metrics.clone(),
    ));

    // === 4. Serve the gateway ===
    let state = AppState {
        repository,
        store,
        cache,
        metrics,
    };
    api::run_server(state, &config.http).await?;

    Ok(())
}
