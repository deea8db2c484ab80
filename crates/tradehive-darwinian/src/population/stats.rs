//! Read-side population queries

use super::store::PopulationSnapshot;
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tradehive_common::{Agent, Specialization, Timeframe};

/// Population-wide aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_agents: usize,
    pub active_agents: usize,
    pub avg_fitness: f64,
    pub total_trades: u64,
    pub winning_trades: u64,
    pub overall_win_rate: f64,
    pub total_profit: Decimal,
    pub generation: u64,
    pub by_specialization: BTreeMap<Specialization, usize>,
}

impl GlobalStats {
    /// Aggregate a snapshot; an empty population yields zeros
    pub fn from_snapshot(snapshot: &PopulationSnapshot) -> Self {
        let mut stats = GlobalStats {
            generation: snapshot.generation(),
            ..Default::default()
        };

        let mut fitness_sum = 0.0;
        for agent in snapshot.iter() {
            stats.total_agents += 1;
            if agent.active {
                stats.active_agents += 1;
            }
            fitness_sum += agent.performance.overall_score;
            stats.total_trades += agent.performance.total_trades;
            stats.winning_trades += agent.performance.winning_trades;
            stats.total_profit += agent.performance.total_profit;
            *stats.by_specialization.entry(agent.specialization).or_default() += 1;
        }

        if stats.total_agents > 0 {
            stats.avg_fitness = fitness_sum / stats.total_agents as f64;
        }
        if stats.total_trades > 0 {
            stats.overall_win_rate = stats.winning_trades as f64 / stats.total_trades as f64;
        }
        stats
    }
}

impl PopulationSnapshot {
    /// Highest `overall_score` first; ties favour the longer trade record
    pub fn top_agents(&self, limit: usize) -> Vec<Agent> {
        let mut ranked: Vec<&Agent> = self.iter().collect();
        ranked.sort_by_key(|a| {
            (
                Reverse(OrderedFloat(a.performance.overall_score)),
                Reverse(a.performance.total_trades),
                a.id,
            )
        });
        ranked.into_iter().take(limit).cloned().collect()
    }

    pub fn by_specialization(&self, specialization: Specialization) -> Vec<Agent> {
        self.iter()
            .filter(|a| a.specialization == specialization)
            .cloned()
            .collect()
    }

    pub fn for_timeframe(&self, timeframe: Timeframe) -> Vec<Agent> {
        self.iter()
            .filter(|a| a.timeframes.contains(&timeframe))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> GlobalStats {
        GlobalStats::from_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breeding::Breeder;
    use crate::population::PopulationStore;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_population_stats_are_zero() {
        let store = PopulationStore::new(10);
        let stats = store.snapshot().stats();
        assert_eq!(stats.total_agents, 0);
        assert_eq!(stats.avg_fitness, 0.0);
        assert_eq!(stats.overall_win_rate, 0.0);
        assert!(stats.avg_fitness.is_finite());
    }

    #[test]
    fn test_stats_aggregate() {
        let mut breeder = Breeder::seeded(5);
        let mut a = breeder.random_agent(0);
        a.performance.total_trades = 10;
        a.performance.winning_trades = 6;
        a.performance.overall_score = 0.3;
        a.performance.total_profit = dec!(12.50);
        let mut b = breeder.random_agent(0);
        b.performance.total_trades = 10;
        b.performance.winning_trades = 2;
        b.performance.overall_score = 0.1;
        b.active = false;

        let store = PopulationStore::with_agents(vec![a, b], 4).unwrap();
        let stats = store.snapshot().stats();

        assert_eq!(stats.total_agents, 2);
        assert_eq!(stats.active_agents, 1);
        assert_eq!(stats.total_trades, 20);
        assert!((stats.overall_win_rate - 0.4).abs() < 1e-12);
        assert!((stats.avg_fitness - 0.2).abs() < 1e-12);
        assert_eq!(stats.total_profit, dec!(12.50));
    }

    #[test]
    fn test_top_agents_ordering_and_limit() {
        let mut breeder = Breeder::seeded(6);
        let agents: Vec<Agent> = [0.2, 0.9, 0.5, 0.7]
            .iter()
            .map(|score| {
                let mut agent = breeder.random_agent(0);
                agent.performance.overall_score = *score;
                agent
            })
            .collect();
        let store = PopulationStore::with_agents(agents, 8).unwrap();

        let top = store.snapshot().top_agents(2);
        let scores: Vec<f64> = top.iter().map(|a| a.performance.overall_score).collect();
        assert_eq!(scores, vec![0.9, 0.7]);
        assert_eq!(store.snapshot().top_agents(50).len(), 4);
    }

    #[test]
    fn test_filters() {
        let mut breeder = Breeder::seeded(7);
        let agents: Vec<Agent> = (0..40).map(|_| breeder.random_agent(0)).collect();
        let store = PopulationStore::with_agents(agents, 80).unwrap();
        let snapshot = store.snapshot();

        for agent in snapshot.by_specialization(Specialization::News) {
            assert_eq!(agent.specialization, Specialization::News);
        }
        let h1 = snapshot.for_timeframe(Timeframe::H1);
        assert!(h1.iter().all(|a| a.timeframes.contains(&Timeframe::H1)));
        let expected = snapshot
            .iter()
            .filter(|a| a.timeframes.contains(&Timeframe::H1))
            .count();
        assert_eq!(h1.len(), expected);
    }
}
