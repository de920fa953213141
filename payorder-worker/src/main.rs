//! # PayOrder Worker
//!
//! Reads payment jobs published by `payorder-api` and marks the orders paid.
//! Run as many workers as needed; each needs a distinct
//! `WORKER_CONSUMER_NAME`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p payorder-worker
//! ```

use anyhow::Context;
use payorder_shared::db::{create_pool, pool::close_pool};
use payorder_shared::redis::RedisClient;
use payorder_worker::{config::WorkerConfig, orchestrator::WorkerOrchestrator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("PayOrder Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env().context("Failed to load configuration")?;

    let pool = create_pool(config.database.clone())
        .await
        .context("Failed to connect to database")?;

    let redis = RedisClient::new(config.redis.clone())
        .await
        .context("Failed to connect to Redis")?;

    let orchestrator = WorkerOrchestrator::with_config(pool.clone(), redis, config.orchestrator);
    let shutdown = orchestrator.shutdown_token();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        shutdown.cancel();
    });

    orchestrator.run().await?;

    close_pool(pool).await;
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "payorder_worker=debug,payorder_shared=info".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
