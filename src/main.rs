use std::sync::Arc;
use std::time::Duration;

use synthmarket::config::Config;
use synthmarket::services::{std_rng, PriceEngine, PriceTicker, SqliteStore, TracingObserver};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "synthmarket=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load and validate configuration before touching the database
    let config = Config::from_env();
    config.validate()?;
    let universe = config.universe()?;
    let params = config.engine_params()?;
    info!(
        "Starting price engine for {} instruments (db: {})",
        universe.len(),
        config.database_path
    );

    let store = Arc::new(SqliteStore::new(
        &config.database_path,
        Duration::from_millis(config.busy_timeout_ms),
    )?);

    for record in store.list_prices()? {
        info!(
            "{} last at {:.2} ({})",
            record.symbol, record.current_price, record.last_updated
        );
    }

    if config.rng_seed.is_some() {
        info!("Using seeded random source");
    }
    let engine = Arc::new(
        PriceEngine::new(store, universe, params, std_rng(config.rng_seed))?
            .with_observer(Arc::new(TracingObserver)),
    );

    if !config.tick.enabled {
        warn!("Price engine disabled (ENABLE_PRICE_TICK)");
        return Ok(());
    }

    let ticker = PriceTicker::start(engine, Duration::from_millis(config.tick.interval_ms));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    ticker.stop().await;

    Ok(())
}
