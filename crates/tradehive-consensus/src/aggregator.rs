//! Consensus aggregator
//!
//! Each cycle reads the contributions inside the sliding window, checks the
//! quorum and confidence gate and, when both hold, emits a signal into the
//! bounded history.

use crate::contributions::ContributionLog;
use crate::history::SignalHistory;
use crate::quorum::{QuorumDecision, QuorumPolicy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument};
use tradehive_common::{
    ConsensusSignal, Contribution, Result, SignalDirection, CONSENSUS_HISTORY_CAPACITY,
    CONSENSUS_THRESHOLD, CONSENSUS_WINDOW_SECS, MIN_QUORUM,
};
use uuid::Uuid;

/// Consensus configuration
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Sliding window length in seconds
    pub window_secs: u64,
    /// Minimum contributions per window
    pub min_quorum: usize,
    /// Average confidence must be strictly above this
    pub threshold: f64,
    /// Signal history capacity
    pub history_capacity: usize,
    /// Upper bound on retained contributions
    pub max_contributions: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            window_secs: CONSENSUS_WINDOW_SECS,
            min_quorum: MIN_QUORUM,
            threshold: CONSENSUS_THRESHOLD,
            history_capacity: CONSENSUS_HISTORY_CAPACITY,
            max_contributions: 10_000,
        }
    }
}

impl ConsensusConfig {
    pub fn window_ms(&self) -> i64 {
        (self.window_secs as i64).saturating_mul(1000)
    }
}

/// Aggregator metrics
#[derive(Debug, Default)]
pub struct ConsensusMetrics {
    pub cycles: AtomicU64,
    pub signals_emitted: AtomicU64,
    pub no_quorum: AtomicU64,
    pub below_threshold: AtomicU64,
    pub contributions_recorded: AtomicU64,
}

/// Point-in-time copy of [`ConsensusMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusMetricsSnapshot {
    pub cycles: u64,
    pub signals_emitted: u64,
    pub no_quorum: u64,
    pub below_threshold: u64,
    pub contributions_recorded: u64,
}

impl ConsensusMetrics {
    pub fn snapshot(&self) -> ConsensusMetricsSnapshot {
        ConsensusMetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            signals_emitted: self.signals_emitted.load(Ordering::Relaxed),
            no_quorum: self.no_quorum.load(Ordering::Relaxed),
            below_threshold: self.below_threshold.load(Ordering::Relaxed),
            contributions_recorded: self.contributions_recorded.load(Ordering::Relaxed),
        }
    }
}

pub struct ConsensusAggregator {
    config: ConsensusConfig,
    policy: QuorumPolicy,
    log: ContributionLog,
    history: SignalHistory,
    metrics: ConsensusMetrics,
}

impl ConsensusAggregator {
    pub fn new(config: ConsensusConfig) -> Self {
        Self {
            policy: QuorumPolicy::new(config.min_quorum, config.threshold),
            log: ContributionLog::new(config.window_ms(), config.max_contributions),
            history: SignalHistory::new(config.history_capacity),
            metrics: ConsensusMetrics::default(),
            config,
        }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ConsensusMetrics {
        &self.metrics
    }

    pub fn history(&self) -> &SignalHistory {
        &self.history
    }

    /// Record an agent contribution
    pub fn record_contribution(&self, contribution: Contribution) -> Result<()> {
        self.log.record(contribution)?;
        self.metrics.contributions_recorded.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Up to `limit` signals, newest first
    pub fn latest_signals(&self, limit: usize) -> Vec<ConsensusSignal> {
        self.history.latest(limit)
    }

    /// Run one aggregation cycle at `now_ms`
    #[instrument(skip(self))]
    pub fn run_cycle(&self, now_ms: i64) -> Option<ConsensusSignal> {
        self.metrics.cycles.fetch_add(1, Ordering::Relaxed);

        let window = self.log.window(now_ms, self.config.window_ms());
        let pruned = self.log.prune(now_ms);
        if pruned > 0 {
            debug!(pruned, "Pruned expired contributions");
        }

        let (count, average) = match self.policy.evaluate(&window) {
            QuorumDecision::NoQuorum { count } => {
                self.metrics.no_quorum.fetch_add(1, Ordering::Relaxed);
                debug!(count, min_quorum = self.policy.min_quorum(), "No consensus: quorum not met");
                return None;
            }
            QuorumDecision::BelowThreshold { count, average } => {
                self.metrics.below_threshold.fetch_add(1, Ordering::Relaxed);
                debug!(count, average, threshold = self.policy.threshold(), "No consensus: confidence below threshold");
                return None;
            }
            QuorumDecision::Reached { count, average } => (count, average),
        };

        let direction = plurality_direction(&window);
        let contributing_agent_ids: BTreeSet<_> = window.iter().map(|c| c.agent_id).collect();
        let signal = ConsensusSignal {
            id: Uuid::now_v7(),
            direction,
            confidence: average.clamp(0.0, 1.0),
            reasoning: format!(
                "{} contributions from {} agents agree on {} with average confidence {:.2} (threshold {:.2})",
                count,
                contributing_agent_ids.len(),
                direction,
                average,
                self.policy.threshold()
            ),
            contributing_agent_ids,
            timestamp: now_ms,
        };

        if self.history.push(signal.clone()).is_some() {
            debug!("Consensus history full, evicted oldest signal");
        }
        self.metrics.signals_emitted.fetch_add(1, Ordering::Relaxed);
        info!(
            signal_id = %signal.id,
            direction = %signal.direction,
            confidence = signal.confidence,
            contributors = signal.contributing_agent_ids.len(),
            "Consensus signal emitted"
        );
        Some(signal)
    }

    /// Run one cycle at the current wall-clock time
    pub fn run_cycle_now(&self) -> Option<ConsensusSignal> {
        self.run_cycle(chrono::Utc::now().timestamp_millis())
    }
}

/// Most frequent direction; any tie for first place resolves to `Hold`
pub fn plurality_direction(window: &[Contribution]) -> SignalDirection {
    let mut counts: HashMap<SignalDirection, usize> = HashMap::new();
    for c in window {
        *counts.entry(c.direction).or_default() += 1;
    }

    let best = counts.values().copied().max().unwrap_or(0);
    let mut leaders = counts.iter().filter(|(_, n)| **n == best).map(|(d, _)| *d);
    match (leaders.next(), leaders.next()) {
        (Some(direction), None) => direction,
        _ => SignalDirection::Hold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradehive_common::AgentId;

    const NOW: i64 = 10_000_000;

    fn contribute(agg: &ConsensusAggregator, direction: SignalDirection, confidence: f64, age_ms: i64) {
        agg.record_contribution(
            Contribution::new(AgentId::new(), direction, confidence, "view").at(NOW - age_ms),
        )
        .unwrap();
    }

    #[test]
    fn test_five_confident_contributions_emit() {
        let agg = ConsensusAggregator::new(ConsensusConfig::default());
        for (i, c) in [0.9, 0.85, 0.8, 0.82, 0.88].iter().enumerate() {
            contribute(&agg, SignalDirection::Buy, *c, 30_000 * i as i64);
        }

        let signal = agg.run_cycle(NOW).unwrap();
        assert!((signal.confidence - 0.85).abs() < 1e-9);
        assert_eq!(signal.direction, SignalDirection::Buy);
        assert_eq!(signal.contributing_agent_ids.len(), 5);
        assert!(signal.reasoning.contains("5 contributions"));
        assert_eq!(agg.latest_signals(10).len(), 1);
    }

    #[test]
    fn test_four_contributions_do_not_emit() {
        let agg = ConsensusAggregator::new(ConsensusConfig::default());
        for _ in 0..4 {
            contribute(&agg, SignalDirection::Sell, 0.95, 1_000);
        }
        assert!(agg.run_cycle(NOW).is_none());
        assert!(agg.latest_signals(10).is_empty());
        assert_eq!(agg.metrics().snapshot().no_quorum, 1);
    }

    #[test]
    fn test_stale_contributions_fall_out_of_window() {
        let agg = ConsensusAggregator::new(ConsensusConfig::default());
        for _ in 0..4 {
            contribute(&agg, SignalDirection::Buy, 0.95, 1_000);
        }
        // six minutes old
        contribute(&agg, SignalDirection::Buy, 0.95, 360_000);

        assert!(agg.run_cycle(NOW).is_none());
    }

    #[test]
    fn test_below_threshold() {
        let agg = ConsensusAggregator::new(ConsensusConfig::default());
        for _ in 0..6 {
            contribute(&agg, SignalDirection::Buy, 0.8, 1_000);
        }
        assert!(agg.run_cycle(NOW).is_none());
        assert_eq!(agg.metrics().snapshot().below_threshold, 1);
    }

    #[test]
    fn test_same_agent_counted_once_in_ids() {
        let agg = ConsensusAggregator::new(ConsensusConfig::default());
        let agent = AgentId::new();
        for _ in 0..5 {
            agg.record_contribution(
                Contribution::new(agent, SignalDirection::Sell, 0.9, "again").at(NOW - 10),
            )
            .unwrap();
        }
        let signal = agg.run_cycle(NOW).unwrap();
        assert_eq!(signal.contributing_agent_ids.len(), 1);
        assert_eq!(signal.direction, SignalDirection::Sell);
    }

    #[test]
    fn test_history_is_bounded() {
        let agg = ConsensusAggregator::new(ConsensusConfig::default());
        for cycle in 0..25 {
            for _ in 0..5 {
                agg.record_contribution(
                    Contribution::new(AgentId::new(), SignalDirection::Buy, 0.9, "").at(NOW + cycle),
                )
                .unwrap();
            }
            assert!(agg.run_cycle(NOW + cycle).is_some());
        }
        assert_eq!(agg.history().len(), CONSENSUS_HISTORY_CAPACITY);
        assert_eq!(agg.latest_signals(1)[0].timestamp, NOW + 24);
    }

    #[test]
    fn test_plurality_ties_hold() {
        let id = AgentId::new();
        let c = |d| Contribution::new(id, d, 0.9, "");
        assert_eq!(
            plurality_direction(&[c(SignalDirection::Buy), c(SignalDirection::Buy), c(SignalDirection::Sell)]),
            SignalDirection::Buy
        );
        assert_eq!(
            plurality_direction(&[c(SignalDirection::Buy), c(SignalDirection::Sell)]),
            SignalDirection::Hold
        );
        assert_eq!(plurality_direction(&[]), SignalDirection::Hold);
    }
}
