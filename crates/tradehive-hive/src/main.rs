//! TradeHive service binary

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tradehive_hive::{
    ConfidenceSource, HiveConfig, JsonFileStore, RandomConfidence, SnapshotStore, TradingHive,
    VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting TradeHive v{}", VERSION);

    let config = HiveConfig::load()?;
    info!(
        target_size = config.population.target_size,
        evolution_interval_secs = config.population.evolution_interval_secs,
        consensus_interval_secs = config.consensus.interval_secs,
        seeded = config.rng_seed.is_some(),
        "Loaded configuration"
    );

    let source: Arc<dyn ConfidenceSource> = match config.rng_seed {
        Some(seed) => Arc::new(RandomConfidence::seeded(seed)),
        None => Arc::new(RandomConfidence::from_entropy()),
    };
    let snapshots: Option<Arc<dyn SnapshotStore>> = config
        .storage
        .snapshot_path
        .as_ref()
        .map(|path| Arc::new(JsonFileStore::new(path)) as Arc<dyn SnapshotStore>);

    let hive = TradingHive::new(config, source)?;

    if let Some(store) = &snapshots {
        if !hive.restore_from(store.as_ref()).await? {
            info!("No snapshot to restore, starting fresh");
        }
    }
    let seeded = hive.seed()?;
    if seeded > 0 {
        info!(agents = seeded, "Seeded initial population");
    }

    hive.start(snapshots.clone());

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    hive.stop().await;

    if let Some(store) = &snapshots {
        if let Err(e) = hive.save_to(store.as_ref()).await {
            warn!(error = %e, "Failed to save population snapshot");
        }
    }

    let stats = hive.global_stats();
    info!(
        agents = stats.total_agents,
        active = stats.active_agents,
        generation = stats.generation,
        avg_fitness = stats.avg_fitness,
        win_rate = stats.overall_win_rate,
        "Shutting down TradeHive"
    );
    Ok(())
}
