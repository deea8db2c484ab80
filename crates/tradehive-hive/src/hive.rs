//! TradingHive: the service facade
//!
//! Owns one shared population store and the three subsystems that act on it
//! (evolution, learning distribution, consensus), plus the scheduler that
//! drives them periodically.

use crate::config::HiveConfig;
use crate::confidence::ConfidenceSource;
use crate::jobs::{build_record, ConsensusJob, DistributionJob, EvolutionJob, SnapshotJob};
use crate::persistence::{PopulationRecord, SnapshotStore};
use crate::sampler::ContributionSampler;
use crate::scheduler::{Job, Scheduler};
use prometheus::Registry;
use std::sync::Arc;
use tracing::{info, warn};
use tradehive_common::{
    Agent, AgentId, ConsensusError, ConsensusSignal, Contribution, LearningEvent,
    LifecycleStatus, Performance, PopulationError, Result, Specialization, Timeframe,
    TradeOutcome,
};
use tradehive_consensus::{ConsensusAggregator, ConsensusMetricsSnapshot};
use tradehive_darwinian::{
    Breeder, CycleOutcome, EvolutionEngine, EvolutionMetrics, GlobalStats, PopulationStore,
};
use tradehive_learning::{DistributionReport, DistributorMetricsSnapshot, LearningDistributor};

pub struct TradingHive {
    config: HiveConfig,
    store: Arc<PopulationStore>,
    evolution: Arc<EvolutionEngine>,
    distributor: Arc<LearningDistributor>,
    consensus: Arc<ConsensusAggregator>,
    sampler: Arc<ContributionSampler>,
    scheduler: Scheduler,
    registry: Registry,
}

impl TradingHive {
    /// Build every subsystem around an empty population
    pub fn new(config: HiveConfig, source: Arc<dyn ConfidenceSource>) -> Result<Self> {
        config.validate()?;

        let evolution_config = config.evolution_config();
        let store = Arc::new(PopulationStore::new(evolution_config.hard_cap()));

        let registry = Registry::new();
        let metrics = EvolutionMetrics::new()?;
        metrics.register(&registry)?;

        let breeder = match config.rng_seed {
            Some(seed) => Breeder::seeded(seed),
            None => Breeder::from_entropy(),
        };
        let evolution = Arc::new(
            EvolutionEngine::new(store.clone(), evolution_config, breeder).with_metrics(metrics),
        );
        let distributor = Arc::new(LearningDistributor::new(store.clone(), config.distributor_config()));
        let consensus = Arc::new(ConsensusAggregator::new(config.consensus_config()));
        let sampler = Arc::new(ContributionSampler::with_seed(
            store.clone(),
            consensus.clone(),
            source,
            config.chatter.sample_size,
            config.rng_seed.map(|seed| seed.wrapping_add(1)),
        ));

        Ok(Self {
            config,
            store,
            evolution,
            distributor,
            consensus,
            sampler,
            scheduler: Scheduler::new(),
            registry,
        })
    }

    pub fn config(&self) -> &HiveConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<PopulationStore> {
        &self.store
    }

    pub fn distributor(&self) -> &Arc<LearningDistributor> {
        &self.distributor
    }

    pub fn consensus(&self) -> &Arc<ConsensusAggregator> {
        &self.consensus
    }

    /// Prometheus registry holding the evolution metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn distributor_metrics(&self) -> DistributorMetricsSnapshot {
        self.distributor.metrics().snapshot()
    }

    pub fn consensus_metrics(&self) -> ConsensusMetricsSnapshot {
        self.consensus.metrics().snapshot()
    }

    /// Seed the archetype population when the store is empty
    pub fn seed(&self) -> Result<usize> {
        self.evolution.seed_if_empty()
    }

    // ---- ingestion ----

    /// Queue a learning event; malformed events are rejected here
    pub fn submit(&self, event: LearningEvent) -> Result<()> {
        self.distributor.submit(event)
    }

    pub fn submit_trade_outcome(&self, outcome: TradeOutcome) -> Result<()> {
        self.distributor.submit_trade_outcome(outcome)
    }

    /// Record a contribution from a member of the population
    pub fn record_contribution(&self, contribution: Contribution) -> Result<()> {
        if !self.store.contains(&contribution.agent_id) {
            return Err(ConsensusError::InvalidContribution(format!(
                "agent {} is not in the population",
                contribution.agent_id
            ))
            .into());
        }
        self.consensus.record_contribution(contribution)
    }

    // ---- queries ----

    pub fn get_top_agents(&self, limit: usize) -> Vec<Agent> {
        self.store.snapshot().top_agents(limit)
    }

    pub fn get_agents_by_specialization(&self, specialization: Specialization) -> Vec<Agent> {
        self.store.snapshot().by_specialization(specialization)
    }

    pub fn get_agents_for_timeframe(&self, timeframe: Timeframe) -> Vec<Agent> {
        self.store.snapshot().for_timeframe(timeframe)
    }

    pub fn global_stats(&self) -> GlobalStats {
        self.store.snapshot().stats()
    }

    /// Newest first
    pub fn latest_consensus_signals(&self, limit: usize) -> Vec<ConsensusSignal> {
        self.consensus.latest_signals(limit)
    }

    // ---- control ----

    pub fn activate(&self, id: &AgentId) -> Result<()> {
        self.set_active(id, true)
    }

    pub fn deactivate(&self, id: &AgentId) -> Result<()> {
        self.set_active(id, false)
    }

    fn set_active(&self, id: &AgentId, active: bool) -> Result<()> {
        if self.store.update_agent(id, |agent| agent.active = active) {
            info!(agent_id = %id, active, "Agent activation changed");
            Ok(())
        } else {
            Err(PopulationError::NotFound(*id).into())
        }
    }

    /// Clear every agent's performance counters; membership is unchanged
    pub fn reset_all(&self) -> usize {
        let count = self.store.update_all(|agent| {
            agent.performance = Performance::default();
            agent.status = LifecycleStatus::Active;
        });
        info!(agents = count, "Performance counters reset");
        count
    }

    // ---- cycles ----

    /// Run one evolution cycle on the calling thread
    pub fn run_evolution_cycle(&self) -> Result<CycleOutcome> {
        self.evolution.run_cycle()
    }

    pub fn run_consensus_cycle(&self, now_ms: i64) -> Option<ConsensusSignal> {
        self.consensus.run_cycle(now_ms)
    }

    pub async fn distribute_pending(&self) -> DistributionReport {
        self.distributor.distribute_pending().await
    }

    /// One round of agent chatter; returns contributions recorded
    pub async fn sample_contributions(&self) -> Result<usize> {
        self.sampler.sample_once().await
    }

    // ---- lifecycle ----

    /// Start the periodic jobs; autosave runs only with a snapshot store
    pub fn start(&self, snapshots: Option<Arc<dyn SnapshotStore>>) {
        if !self.scheduler.running().is_empty() {
            warn!("Hive jobs already running");
            return;
        }

        let cfg = &self.config;
        self.scheduler.spawn(
            Arc::new(EvolutionJob::new(self.evolution.clone())),
            cfg.population.evolution_interval(),
        );
        self.scheduler.spawn(
            Arc::new(ConsensusJob::new(self.consensus.clone())),
            cfg.consensus.interval(),
        );
        self.scheduler.spawn(
            Arc::new(DistributionJob::new(self.distributor.clone())),
            cfg.learning.delivery_interval(),
        );
        if cfg.chatter.enabled {
            let sampler: Arc<dyn Job> = self.sampler.clone();
            self.scheduler.spawn(sampler, cfg.chatter.interval());
        }
        if let (Some(snapshots), Some(period)) = (snapshots, cfg.storage.autosave_interval()) {
            self.scheduler.spawn(
                Arc::new(SnapshotJob::new(self.store.clone(), self.consensus.clone(), snapshots)),
                period,
            );
        }

        info!(jobs = ?self.scheduler.running(), "Hive started");
    }

    pub fn running_jobs(&self) -> Vec<&'static str> {
        self.scheduler.running()
    }

    /// Stop every job; in-flight ticks finish first
    pub async fn stop(&self) {
        self.scheduler.shutdown().await;
        info!("Hive stopped");
    }

    // ---- persistence ----

    pub fn to_record(&self) -> PopulationRecord {
        build_record(&self.store, &self.consensus)
    }

    /// Replace the population, generation and signal history from a record
    pub fn restore(&self, record: PopulationRecord) -> Result<()> {
        let agents = record.agents.len();
        self.store.replace(record.agents, record.generation)?;
        self.consensus.history().restore(record.signals);
        info!(agents, generation = record.generation, "Population restored");
        Ok(())
    }

    pub async fn save_to(&self, snapshots: &dyn SnapshotStore) -> Result<()> {
        snapshots.save(&self.to_record()).await
    }

    /// Restore from `snapshots`; false when it holds nothing yet
    pub async fn restore_from(&self, snapshots: &dyn SnapshotStore) -> Result<bool> {
        match snapshots.load().await? {
            Some(record) => {
                self.restore(record)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::ScriptedConfidence;
    use tradehive_common::{HiveError, SignalDirection};

    fn hive(target: usize) -> TradingHive {
        let mut config = HiveConfig::default();
        config.population.target_size = target;
        config.rng_seed = Some(21);
        TradingHive::new(
            config,
            Arc::new(ScriptedConfidence::constant(SignalDirection::Buy, 0.9)),
        )
        .unwrap()
    }

    #[test]
    fn test_seed_and_query() {
        let hive = hive(90);
        assert_eq!(hive.seed().unwrap(), 90);

        let stats = hive.global_stats();
        assert_eq!(stats.total_agents, 90);
        assert_eq!(stats.active_agents, 90);
        assert_eq!(stats.generation, 0);

        assert_eq!(hive.get_top_agents(10).len(), 10);
        // one archetype per specialization
        assert_eq!(hive.get_agents_by_specialization(Specialization::Scalping).len(), 10);
    }

    #[test]
    fn test_unknown_contributor_rejected() {
        let hive = hive(10);
        hive.seed().unwrap();
        let err = hive
            .record_contribution(Contribution::new(AgentId::new(), SignalDirection::Buy, 0.9, "?"))
            .unwrap_err();
        assert!(matches!(err, HiveError::Consensus(ConsensusError::InvalidContribution(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = HiveConfig::default();
        config.consensus.min_quorum = 0;
        let built = TradingHive::new(config, Arc::new(ScriptedConfidence::constant(SignalDirection::Hold, 0.5)));
        assert!(matches!(built, Err(HiveError::Config(_))));
    }

    #[test]
    fn test_registry_exposes_evolution_metrics() {
        let hive = hive(20);
        hive.seed().unwrap();
        hive.run_evolution_cycle().unwrap();
        let names: Vec<String> = hive.registry().gather().iter().map(|f| f.get_name().to_string()).collect();
        assert!(names.iter().any(|n| n.contains("cycles_completed")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop_jobs() {
        let hive = hive(20);
        hive.seed().unwrap();
        hive.start(None);
        assert_eq!(hive.running_jobs().len(), 4);

        hive.start(None);
        assert_eq!(hive.running_jobs().len(), 4);

        hive.stop().await;
        assert!(hive.running_jobs().is_empty());
    }
}
