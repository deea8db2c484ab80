//! TradeHive configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tradehive_common::{
    HiveError, Result, CONSENSUS_HISTORY_CAPACITY, CONSENSUS_INTERVAL_SECS, CONSENSUS_THRESHOLD,
    CONSENSUS_WINDOW_SECS, CROSSOVER_CHILDREN, DEFAULT_FLOOR_RATIO, DEFAULT_HARD_CAP_RATIO,
    DEFAULT_TARGET_POPULATION, EVOLUTION_INTERVAL_SECS, GRACE_GENERATIONS, LEARNING_QUEUE_CAPACITY,
    MIN_QUORUM, RETIREMENT_THRESHOLD, STABILITY_TRADES, TOP_K,
};
use tradehive_consensus::ConsensusConfig;
use tradehive_darwinian::EvolutionConfig;
use tradehive_learning::DistributorConfig;

/// Environment variable prefix; nested keys are separated by `__`
pub const ENV_PREFIX: &str = "HIVE";

/// Default config file name (`hive.toml`, optional)
pub const CONFIG_FILE: &str = "hive";

/// TradeHive service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HiveConfig {
    pub population: PopulationSettings,
    pub learning: LearningSettings,
    pub consensus: ConsensusSettings,
    pub chatter: ChatterSettings,
    pub storage: StorageSettings,
    /// Seed for every random source; entropy when unset
    pub rng_seed: Option<u64>,
}

impl HiveConfig {
    /// Load from `.env`, an optional `hive.toml` and `HIVE__*` variables
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load with an explicit config file name (extension optional)
    pub fn load_from(file: &str) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| HiveError::Config(e.to_string()))?;

        let cfg: HiveConfig = settings
            .try_deserialize()
            .map_err(|e| HiveError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings no subsystem can run with
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(HiveError::Config(msg.to_string()));
        let p = &self.population;

        if p.target_size == 0 {
            return fail("population.target_size must be positive");
        }
        if !(p.floor_ratio > 0.0 && p.floor_ratio <= 1.0) {
            return fail("population.floor_ratio must be in (0, 1]");
        }
        if p.hard_cap_ratio.is_nan() || p.hard_cap_ratio < 1.0 {
            return fail("population.hard_cap_ratio must be at least 1");
        }
        if !(0.0..=1.0).contains(&p.retirement_threshold) {
            return fail("population.retirement_threshold must be in [0, 1]");
        }
        if p.stability_trades == 0 {
            return fail("population.stability_trades must be positive");
        }
        if p.evolution_interval_secs == 0 {
            return fail("population.evolution_interval_secs must be positive");
        }
        if self.learning.queue_capacity == 0 || self.learning.batch_size == 0 {
            return fail("learning capacities must be positive");
        }
        if self.learning.delivery_interval_ms == 0 {
            return fail("learning.delivery_interval_ms must be positive");
        }
        let c = &self.consensus;
        if c.min_quorum == 0 {
            return fail("consensus.min_quorum must be positive");
        }
        if !(0.0..=1.0).contains(&c.threshold) {
            return fail("consensus.threshold must be in [0, 1]");
        }
        if c.history_capacity == 0 || c.window_secs == 0 || c.interval_secs == 0 {
            return fail("consensus window, interval and history capacity must be positive");
        }
        if self.chatter.enabled && (self.chatter.sample_size == 0 || self.chatter.interval_secs == 0) {
            return fail("chatter.sample_size and chatter.interval_secs must be positive");
        }
        Ok(())
    }

    pub fn evolution_config(&self) -> EvolutionConfig {
        let p = &self.population;
        EvolutionConfig {
            target_size: p.target_size,
            floor_ratio: p.floor_ratio,
            hard_cap_ratio: p.hard_cap_ratio,
            retirement_threshold: p.retirement_threshold,
            grace_generations: p.grace_generations,
            top_k: p.top_k,
            crossover_children: p.crossover_children,
            stability_trades: p.stability_trades,
        }
    }

    pub fn distributor_config(&self) -> DistributorConfig {
        DistributorConfig {
            queue_capacity: self.learning.queue_capacity,
            batch_size: self.learning.batch_size,
            chunk_size: self.learning.chunk_size,
        }
    }

    pub fn consensus_config(&self) -> ConsensusConfig {
        let c = &self.consensus;
        ConsensusConfig {
            window_secs: c.window_secs,
            min_quorum: c.min_quorum,
            threshold: c.threshold,
            history_capacity: c.history_capacity,
            max_contributions: c.max_contributions,
        }
    }
}

/// Population and evolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationSettings {
    pub target_size: usize,
    pub floor_ratio: f64,
    pub hard_cap_ratio: f64,
    pub retirement_threshold: f64,
    pub grace_generations: u64,
    pub top_k: usize,
    pub crossover_children: usize,
    pub stability_trades: u64,
    pub evolution_interval_secs: u64,
}

impl Default for PopulationSettings {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_POPULATION,
            floor_ratio: DEFAULT_FLOOR_RATIO,
            hard_cap_ratio: DEFAULT_HARD_CAP_RATIO,
            retirement_threshold: RETIREMENT_THRESHOLD,
            grace_generations: GRACE_GENERATIONS,
            top_k: TOP_K,
            crossover_children: CROSSOVER_CHILDREN,
            stability_trades: STABILITY_TRADES,
            evolution_interval_secs: EVOLUTION_INTERVAL_SECS,
        }
    }
}

impl PopulationSettings {
    pub fn evolution_interval(&self) -> Duration {
        Duration::from_secs(self.evolution_interval_secs)
    }
}

/// Learning distribution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningSettings {
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub chunk_size: usize,
    /// Delivery loop period in milliseconds
    pub delivery_interval_ms: u64,
}

impl Default for LearningSettings {
    fn default() -> Self {
        let distributor = DistributorConfig::default();
        Self {
            queue_capacity: LEARNING_QUEUE_CAPACITY,
            batch_size: distributor.batch_size,
            chunk_size: distributor.chunk_size,
            delivery_interval_ms: 1000,
        }
    }
}

impl LearningSettings {
    pub fn delivery_interval(&self) -> Duration {
        Duration::from_millis(self.delivery_interval_ms)
    }
}

/// Consensus aggregation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusSettings {
    pub window_secs: u64,
    pub min_quorum: usize,
    pub threshold: f64,
    pub history_capacity: usize,
    pub max_contributions: usize,
    pub interval_secs: u64,
}

impl Default for ConsensusSettings {
    fn default() -> Self {
        Self {
            window_secs: CONSENSUS_WINDOW_SECS,
            min_quorum: MIN_QUORUM,
            threshold: CONSENSUS_THRESHOLD,
            history_capacity: CONSENSUS_HISTORY_CAPACITY,
            max_contributions: ConsensusConfig::default().max_contributions,
            interval_secs: CONSENSUS_INTERVAL_SECS,
        }
    }
}

impl ConsensusSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Agent chatter (contribution sampling) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatterSettings {
    pub enabled: bool,
    /// Agents asked for an assessment per tick
    pub sample_size: usize,
    pub interval_secs: u64,
}

impl Default for ChatterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_size: 8,
            interval_secs: 15,
        }
    }
}

impl ChatterSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Snapshot persistence settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// JSON snapshot file; persistence is disabled when unset
    pub snapshot_path: Option<String>,
    /// Periodic save interval; 0 saves only on shutdown
    pub autosave_interval_secs: u64,
}

impl StorageSettings {
    pub fn autosave_interval(&self) -> Option<Duration> {
        (self.autosave_interval_secs > 0).then(|| Duration::from_secs(self.autosave_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let cfg = HiveConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.population.target_size, 5000);
        assert_eq!(cfg.learning.queue_capacity, 1000);
        assert_eq!(cfg.consensus.min_quorum, 5);
        assert_eq!(cfg.consensus.history_capacity, 20);
        assert_eq!(cfg.population.evolution_interval(), Duration::from_secs(300));
        assert_eq!(cfg.consensus.interval(), Duration::from_secs(60));

        let evolution = cfg.evolution_config();
        assert_eq!(evolution.floor(), 4900);
    }

    #[test]
    fn test_validate_rejects_nonsense() {
        let mut cfg = HiveConfig::default();
        cfg.population.target_size = 0;
        assert!(matches!(cfg.validate(), Err(HiveError::Config(_))));

        let mut cfg = HiveConfig::default();
        cfg.population.floor_ratio = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = HiveConfig::default();
        cfg.consensus.threshold = -0.1;
        assert!(cfg.validate().is_err());

        let mut cfg = HiveConfig::default();
        cfg.consensus.min_quorum = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = HiveConfig::default();
        cfg.learning.queue_capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let cfg: HiveConfig = serde_json::from_str(r#"{"population": {"target_size": 200}}"#).unwrap();
        assert_eq!(cfg.population.target_size, 200);
        assert_eq!(cfg.population.top_k, TOP_K);
        assert_eq!(cfg.consensus.window_secs, CONSENSUS_WINDOW_SECS);
        assert!(cfg.rng_seed.is_none());
    }

    #[test]
    fn test_autosave_interval() {
        let mut storage = StorageSettings::default();
        assert!(storage.autosave_interval().is_none());
        storage.autosave_interval_secs = 30;
        assert_eq!(storage.autosave_interval(), Some(Duration::from_secs(30)));
    }
}
