//! Learning distributor
//!
//! Accepts learning events at the ingestion boundary and fans them out to
//! interested agents:
//! - Validation before enqueueing (malformed events are never queued)
//! - Bounded FIFO retention with oldest-first eviction
//! - Best-effort delivery through `PopulationStore::update_agent`

use crate::effects::apply_event;
use crate::queue::LearningQueue;
use crate::routing::Route;
use dashmap::DashMap;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use tradehive_common::{
    AgentId, LearningEvent, LearningEventType, Result, TradeOutcome, LEARNING_QUEUE_CAPACITY,
};
use tradehive_darwinian::PopulationStore;

/// Configuration for the learning distributor
#[derive(Debug, Clone)]
pub struct DistributorConfig {
    /// Queue capacity
    pub queue_capacity: usize,
    /// Maximum events taken from the queue per distribution pass
    pub batch_size: usize,
    /// Target agents handled by one delivery task
    pub chunk_size: usize,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: LEARNING_QUEUE_CAPACITY,
            batch_size: 100,
            chunk_size: 512,
        }
    }
}

/// Distributor metrics
#[derive(Debug, Default)]
pub struct DistributorMetrics {
    pub events_received: AtomicU64,
    pub events_rejected: AtomicU64,
    pub events_evicted: AtomicU64,
    pub events_distributed: AtomicU64,
    pub deliveries: AtomicU64,
    pub deliveries_skipped: AtomicU64,
}

/// Point-in-time copy of [`DistributorMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorMetricsSnapshot {
    pub events_received: u64,
    pub events_rejected: u64,
    pub events_evicted: u64,
    pub events_distributed: u64,
    pub deliveries: u64,
    pub deliveries_skipped: u64,
}

impl DistributorMetrics {
    pub fn snapshot(&self) -> DistributorMetricsSnapshot {
        DistributorMetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            events_evicted: self.events_evicted.load(Ordering::Relaxed),
            events_distributed: self.events_distributed.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            deliveries_skipped: self.deliveries_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Result of one distribution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistributionReport {
    pub events: usize,
    /// Agents updated
    pub delivered: u64,
    /// Targets that no longer exist
    pub skipped: u64,
}

pub struct LearningDistributor {
    store: Arc<PopulationStore>,
    queue: LearningQueue,
    config: DistributorConfig,
    metrics: DistributorMetrics,
    received_by_type: DashMap<LearningEventType, u64>,
}

impl LearningDistributor {
    pub fn new(store: Arc<PopulationStore>, config: DistributorConfig) -> Self {
        Self {
            store,
            queue: LearningQueue::new(config.queue_capacity),
            config,
            metrics: DistributorMetrics::default(),
            received_by_type: DashMap::new(),
        }
    }

    /// Submit a learning event
    ///
    /// Never blocks. Returns an error only for malformed events, which are
    /// not enqueued.
    #[instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub fn submit(&self, event: LearningEvent) -> Result<()> {
        if let Err(e) = event.validate() {
            self.metrics.events_rejected.fetch_add(1, Ordering::Relaxed);
            warn!(event_id = %event.id, error = %e, "Rejected learning event");
            return Err(e.into());
        }

        *self.received_by_type.entry(event.event_type).or_insert(0) += 1;
        self.metrics.events_received.fetch_add(1, Ordering::Relaxed);

        if let Some(evicted) = self.queue.push(event) {
            self.metrics.events_evicted.fetch_add(1, Ordering::Relaxed);
            debug!(event_id = %evicted.id, "Learning queue full, evicted oldest event");
        }
        Ok(())
    }

    /// Submit a closed-trade outcome as a performance event
    pub fn submit_trade_outcome(&self, outcome: TradeOutcome) -> Result<()> {
        self.submit(outcome.into_event())
    }

    pub fn queue(&self) -> &LearningQueue {
        &self.queue
    }

    pub fn metrics(&self) -> &DistributorMetrics {
        &self.metrics
    }

    /// Events of `event_type` accepted so far
    pub fn received(&self, event_type: LearningEventType) -> u64 {
        self.received_by_type
            .get(&event_type)
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Drain a batch from the queue and deliver it
    ///
    /// Each event's targets are split into chunks updated on independent
    /// tasks; tasks are joined only to account for the pass.
    #[instrument(skip(self))]
    pub async fn distribute_pending(&self) -> DistributionReport {
        let events = self.queue.drain(self.config.batch_size);
        if events.is_empty() {
            return DistributionReport::default();
        }

        let mut report = DistributionReport {
            events: events.len(),
            ..Default::default()
        };
        let chunk_size = self.config.chunk_size.max(1);

        for event in events {
            let snapshot = self.store.snapshot();
            let targets = Route::for_event(&event).resolve(&snapshot);
            drop(snapshot);

            let event = Arc::new(event);
            let tasks = targets.chunks(chunk_size).map(|chunk| {
                let store = self.store.clone();
                let event = event.clone();
                let chunk: Vec<AgentId> = chunk.to_vec();
                tokio::spawn(async move { deliver(&store, &event, &chunk) })
            });

            for joined in join_all(tasks).await {
                match joined {
                    Ok((delivered, skipped)) => {
                        report.delivered += delivered;
                        report.skipped += skipped;
                    }
                    Err(e) => warn!(error = %e, "Learning delivery task failed"),
                }
            }
            self.metrics.events_distributed.fetch_add(1, Ordering::Relaxed);
        }

        self.metrics.deliveries.fetch_add(report.delivered, Ordering::Relaxed);
        self.metrics
            .deliveries_skipped
            .fetch_add(report.skipped, Ordering::Relaxed);
        info!(
            events = report.events,
            delivered = report.delivered,
            skipped = report.skipped,
            "Distributed learning events"
        );
        report
    }
}

/// Apply an event to each target; missing agents are skipped
fn deliver(store: &PopulationStore, event: &LearningEvent, targets: &[AgentId]) -> (u64, u64) {
    let now = chrono::Utc::now().timestamp_millis();
    let mut delivered = 0;
    let mut skipped = 0;
    for id in targets {
        if store.update_agent(id, |agent| apply_event(agent, event, now)) {
            delivered += 1;
        } else {
            skipped += 1;
        }
    }
    (delivered, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::PATTERN_CAPABILITIES;
    use rust_decimal_macros::dec;
    use tradehive_common::{HiveError, LearningError};
    use tradehive_darwinian::Breeder;

    fn distributor(agents: usize, config: DistributorConfig) -> LearningDistributor {
        let mut breeder = Breeder::seeded(31);
        let agents: Vec<_> = (0..agents).map(|_| breeder.random_agent(0)).collect();
        let store = Arc::new(PopulationStore::with_agents(agents.clone(), agents.len() * 2 + 1).unwrap());
        LearningDistributor::new(store, config)
    }

    #[test]
    fn test_malformed_event_rejected() {
        let d = distributor(3, DistributorConfig::default());

        let missing_success = LearningEvent::new(LearningEventType::Performance, "executor");
        assert!(matches!(
            d.submit(missing_success),
            Err(HiveError::Learning(LearningError::MissingField("success")))
        ));

        let bad_confidence = LearningEvent::new(LearningEventType::Pattern, "vision").with_confidence(1.5);
        assert!(d.submit(bad_confidence).is_err());

        assert!(d.queue().is_empty());
        assert_eq!(d.metrics().snapshot().events_rejected, 2);
    }

    #[test]
    fn test_queue_at_capacity_evicts_oldest() {
        let d = distributor(1, DistributorConfig::default());
        let first = LearningEvent::new(LearningEventType::Session, "s");
        let first_id = first.id;
        d.submit(first).unwrap();
        for _ in 1..LEARNING_QUEUE_CAPACITY {
            d.submit(LearningEvent::new(LearningEventType::Session, "s")).unwrap();
        }
        assert_eq!(d.queue().len(), LEARNING_QUEUE_CAPACITY);

        d.submit(LearningEvent::new(LearningEventType::Session, "s")).unwrap();

        assert_eq!(d.queue().len(), LEARNING_QUEUE_CAPACITY);
        assert!(!d.queue().contains(&first_id));
        assert_eq!(d.metrics().snapshot().events_evicted, 1);
        assert_eq!(d.received(LearningEventType::Session), LEARNING_QUEUE_CAPACITY as u64 + 1);
    }

    #[tokio::test]
    async fn test_broadcast_trade_outcome() {
        let d = distributor(20, DistributorConfig::default());
        d.submit_trade_outcome(TradeOutcome {
            success: true,
            profit: dec!(10),
            signal_confidence: 0.85,
            reasoning: "consensus".into(),
            agent_ids: vec![],
            source: "executor".into(),
        })
        .unwrap();

        let report = d.distribute_pending().await;
        assert_eq!(report.events, 1);
        assert_eq!(report.delivered, 20);

        let snapshot = d.store.snapshot();
        assert!(snapshot
            .iter()
            .all(|a| a.performance.total_trades == 1 && a.performance.winning_trades == 1));
    }

    #[tokio::test]
    async fn test_targeted_outcome_skips_retired() {
        let d = distributor(5, DistributorConfig::default());
        let snapshot = d.store.snapshot();
        let credited = snapshot.iter().next().unwrap().id;
        let ghost = AgentId::new();

        d.submit_trade_outcome(TradeOutcome {
            success: false,
            profit: dec!(-2),
            signal_confidence: 0.9,
            reasoning: "fade".into(),
            agent_ids: vec![credited, ghost],
            source: "executor".into(),
        })
        .unwrap();

        let report = d.distribute_pending().await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(d.store.get(&credited).unwrap().performance.total_trades, 1);

        let untouched = d
            .store
            .snapshot()
            .iter()
            .filter(|a| a.performance.total_trades == 0)
            .count();
        assert_eq!(untouched, 4);
    }

    #[tokio::test]
    async fn test_pattern_only_reaches_capable_agents() {
        let config = DistributorConfig {
            chunk_size: 3,
            ..Default::default()
        };
        let d = distributor(40, config);
        d.submit(LearningEvent::new(LearningEventType::Pattern, "vision").with_confidence(0.9))
            .unwrap();

        let report = d.distribute_pending().await;

        let snapshot = d.store.snapshot();
        let capable = snapshot
            .iter()
            .filter(|a| a.has_any_capability(PATTERN_CAPABILITIES))
            .count() as u64;
        assert_eq!(report.delivered, capable);
        for agent in snapshot.iter() {
            let learned = agent.performance.patterns_learned == 1;
            assert_eq!(learned, agent.has_any_capability(PATTERN_CAPABILITIES));
        }
    }

    #[tokio::test]
    async fn test_batch_size_limits_pass() {
        let config = DistributorConfig {
            batch_size: 2,
            ..Default::default()
        };
        let d = distributor(2, config);
        for _ in 0..5 {
            d.submit(LearningEvent::new(LearningEventType::Session, "s")).unwrap();
        }
        assert_eq!(d.distribute_pending().await.events, 2);
        assert_eq!(d.queue().len(), 3);
    }
}
