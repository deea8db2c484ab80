//! Scheduled jobs wiring the subsystems to the scheduler

use crate::persistence::{PopulationRecord, SnapshotStore};
use crate::scheduler::Job;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use tradehive_common::{HiveError, Result};
use tradehive_consensus::ConsensusAggregator;
use tradehive_darwinian::{CycleOutcome, EvolutionEngine, PopulationStore};
use tradehive_learning::LearningDistributor;

/// Runs an evolution cycle off the async workers
pub struct EvolutionJob {
    engine: Arc<EvolutionEngine>,
}

impl EvolutionJob {
    pub fn new(engine: Arc<EvolutionEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Job for EvolutionJob {
    fn name(&self) -> &'static str {
        "evolution"
    }

    async fn tick(&self) -> Result<()> {
        let engine = self.engine.clone();
        let outcome = tokio::task::spawn_blocking(move || engine.run_cycle())
            .await
            .map_err(|e| HiveError::Internal(format!("evolution task failed: {e}")))??;
        if let CycleOutcome::Skipped = outcome {
            debug!("Evolution tick skipped, previous cycle still running");
        }
        Ok(())
    }
}

pub struct ConsensusJob {
    aggregator: Arc<ConsensusAggregator>,
}

impl ConsensusJob {
    pub fn new(aggregator: Arc<ConsensusAggregator>) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl Job for ConsensusJob {
    fn name(&self) -> &'static str {
        "consensus"
    }

    async fn tick(&self) -> Result<()> {
        self.aggregator.run_cycle_now();
        Ok(())
    }
}

pub struct DistributionJob {
    distributor: Arc<LearningDistributor>,
}

impl DistributionJob {
    pub fn new(distributor: Arc<LearningDistributor>) -> Self {
        Self { distributor }
    }
}

#[async_trait]
impl Job for DistributionJob {
    fn name(&self) -> &'static str {
        "learning-distribution"
    }

    async fn tick(&self) -> Result<()> {
        let report = self.distributor.distribute_pending().await;
        if report.events > 0 {
            debug!(events = report.events, delivered = report.delivered, "Learning batch delivered");
        }
        Ok(())
    }
}

/// Periodic population snapshot
pub struct SnapshotJob {
    store: Arc<PopulationStore>,
    aggregator: Arc<ConsensusAggregator>,
    snapshots: Arc<dyn SnapshotStore>,
}

impl SnapshotJob {
    pub fn new(
        store: Arc<PopulationStore>,
        aggregator: Arc<ConsensusAggregator>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            store,
            aggregator,
            snapshots,
        }
    }
}

/// Capture the population and signal history as one record
pub fn build_record(store: &PopulationStore, aggregator: &ConsensusAggregator) -> PopulationRecord {
    let snapshot = store.snapshot();
    PopulationRecord {
        generation: snapshot.generation(),
        saved_at: chrono::Utc::now().timestamp_millis(),
        agents: snapshot.to_vec(),
        signals: aggregator.history().to_vec(),
    }
}

#[async_trait]
impl Job for SnapshotJob {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn tick(&self) -> Result<()> {
        let record = build_record(&self.store, &self.aggregator);
        self.snapshots.save(&record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemorySnapshotStore;
    use tradehive_common::{Contribution, LearningEvent, LearningEventType, SignalDirection};
    use tradehive_consensus::ConsensusConfig;
    use tradehive_darwinian::{Breeder, EvolutionConfig};
    use tradehive_learning::DistributorConfig;

    fn small_config() -> EvolutionConfig {
        EvolutionConfig {
            target_size: 50,
            ..EvolutionConfig::default()
        }
    }

    #[tokio::test]
    async fn test_evolution_job_advances_generation() {
        let config = small_config();
        let store = Arc::new(PopulationStore::new(config.hard_cap()));
        let engine = Arc::new(EvolutionEngine::new(store.clone(), config, Breeder::seeded(4)));
        engine.seed_if_empty().unwrap();

        EvolutionJob::new(engine).tick().await.unwrap();
        assert_eq!(store.generation(), 1);
        assert_eq!(store.len(), 50);
    }

    #[tokio::test]
    async fn test_distribution_job_drains_queue() {
        let mut breeder = Breeder::seeded(1);
        let store = Arc::new(
            PopulationStore::with_agents((0..10).map(|_| breeder.random_agent(0)).collect(), 100).unwrap(),
        );
        let distributor = Arc::new(LearningDistributor::new(store, DistributorConfig::default()));
        distributor
            .submit(LearningEvent::new(LearningEventType::Session, "desk"))
            .unwrap();

        DistributionJob::new(distributor.clone()).tick().await.unwrap();
        assert!(distributor.queue().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_job_captures_history() {
        let mut breeder = Breeder::seeded(6);
        let store = Arc::new(
            PopulationStore::with_agents((0..5).map(|_| breeder.random_agent(0)).collect(), 10).unwrap(),
        );
        let aggregator = Arc::new(ConsensusAggregator::new(ConsensusConfig::default()));
        for agent in store.snapshot().iter() {
            aggregator
                .record_contribution(Contribution::new(agent.id, SignalDirection::Buy, 0.95, "breakout"))
                .unwrap();
        }
        ConsensusJob::new(aggregator.clone()).tick().await.unwrap();

        let snapshots = Arc::new(InMemorySnapshotStore::new());
        SnapshotJob::new(store, aggregator, snapshots.clone()).tick().await.unwrap();

        let record = snapshots.load().await.unwrap().unwrap();
        assert_eq!(record.agents.len(), 5);
        assert_eq!(record.signals.len(), 1);
    }
}
