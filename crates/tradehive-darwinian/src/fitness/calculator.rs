//! Fitness calculation: η = win_rate × min(1, trades / stability_trades)

use tradehive_common::{Agent, AgentId, Performance, STABILITY_TRADES};

/// Computes an agent's scalar fitness from its trade counters
///
/// The stability term keeps an agent with one lucky trade from outranking
/// agents with a long, solid record.
#[derive(Debug, Clone, Copy)]
pub struct FitnessCalculator {
    stability_trades: u64,
}

impl FitnessCalculator {
    pub fn new(stability_trades: u64) -> Self {
        Self {
            stability_trades: stability_trades.max(1),
        }
    }

    /// Calculate fitness from performance counters
    pub fn calculate(&self, performance: &Performance) -> f64 {
        if performance.total_trades == 0 {
            return 0.0;
        }
        let stability =
            (performance.total_trades as f64 / self.stability_trades as f64).min(1.0);
        performance.win_rate() * stability
    }

    /// Score every agent in a snapshot
    pub fn evaluate<'a, I>(&self, agents: I) -> Vec<(AgentId, f64)>
    where
        I: IntoIterator<Item = &'a Agent>,
    {
        agents
            .into_iter()
            .map(|agent| (agent.id, self.calculate(&agent.performance)))
            .collect()
    }
}

impl Default for FitnessCalculator {
    fn default() -> Self {
        Self::new(STABILITY_TRADES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(total: u64, wins: u64) -> Performance {
        Performance {
            total_trades: total,
            winning_trades: wins,
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_trades_scores_zero() {
        let calc = FitnessCalculator::default();
        assert_eq!(calc.calculate(&perf(0, 0)), 0.0);
    }

    #[test]
    fn test_single_lucky_trade_is_damped() {
        let calc = FitnessCalculator::default();
        // 100% win rate on one trade: 1.0 × 1/20
        assert!((calc.calculate(&perf(1, 1)) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_stability_saturates() {
        let calc = FitnessCalculator::default();
        assert!((calc.calculate(&perf(20, 15)) - 0.75).abs() < 1e-12);
        assert!((calc.calculate(&perf(200, 150)) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_partial_stability() {
        let calc = FitnessCalculator::new(10);
        // 0.8 win rate × 5/10
        assert!((calc.calculate(&perf(5, 4)) - 0.4).abs() < 1e-12);
    }
}
