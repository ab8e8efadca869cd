use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use food_orders::cache::{ListingCache, RedisListingCache};
use food_orders::config::AppConfig;
use food_orders::engine::LifecycleEngine;
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

    tracing::info!("🚀 Background worker starting");

    let config = AppConfig::from_env();
    let cache = Arc::new(RedisListingCache::new(&config.cache)?);

    // === 1. Wait for both dependencies with one combined probe ===
    let database = &config.database;
    let probe_cache = cache.clone();
    let store = wait_for_ready("services", &config.readiness, move || {
        let cache = probe_cache.clone();
        async move {
            let store = PgOrderStore::connect(database).await?;
            cache.ping().await?;
            anyhow::Ok(store)
        }
    })
    .await?;
    store.init_schema().await?;
    let store = Arc::new(store);

    // === 2. Build the fulfillment engine ===
    let metrics = Arc::new(Metrics::new()?);
    let repository = Arc::new(OrderRepository::new(
        store,
        cache,
        &config.cache,
        metrics.clone(),
    ));
    let engine = LifecycleEngine::new(repository, config.engine.clone(), metrics);

    tracing::info!("Worker started successfully");
    engine.run().await;

    Ok(())
}
