//! Quorum and confidence gate

use tradehive_common::Contribution;

/// Outcome of checking one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuorumDecision {
    /// Fewer contributions than the quorum
    NoQuorum { count: usize },
    /// Quorum met but average confidence not above the threshold
    BelowThreshold { count: usize, average: f64 },
    Reached { count: usize, average: f64 },
}

impl QuorumDecision {
    pub fn is_reached(&self) -> bool {
        matches!(self, QuorumDecision::Reached { .. })
    }
}

pub struct QuorumPolicy {
    min_quorum: usize,
    threshold: f64,
}

impl QuorumPolicy {
    pub fn new(min_quorum: usize, threshold: f64) -> Self {
        Self {
            min_quorum,
            threshold,
        }
    }

    pub fn min_quorum(&self) -> usize {
        self.min_quorum
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Emit iff `count >= min_quorum` and `average > threshold`
    pub fn evaluate(&self, window: &[Contribution]) -> QuorumDecision {
        let count = window.len();
        if count == 0 || count < self.min_quorum {
            return QuorumDecision::NoQuorum { count };
        }
        let average = window.iter().map(|c| c.confidence).sum::<f64>() / count as f64;
        if average > self.threshold {
            QuorumDecision::Reached { count, average }
        } else {
            QuorumDecision::BelowThreshold { count, average }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tradehive_common::{AgentId, SignalDirection};

    fn window(confidences: &[f64]) -> Vec<Contribution> {
        confidences
            .iter()
            .map(|c| Contribution::new(AgentId::new(), SignalDirection::Buy, *c, ""))
            .collect()
    }

    #[test]
    fn test_quorum_reached() {
        let policy = QuorumPolicy::new(5, 0.8);
        match policy.evaluate(&window(&[0.9, 0.85, 0.8, 0.82, 0.88])) {
            QuorumDecision::Reached { count, average } => {
                assert_eq!(count, 5);
                assert!((average - 0.85).abs() < 1e-9);
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[test]
    fn test_four_confident_contributions_are_not_enough() {
        let policy = QuorumPolicy::new(5, 0.8);
        assert_eq!(
            policy.evaluate(&window(&[0.95, 0.95, 0.95, 0.95])),
            QuorumDecision::NoQuorum { count: 4 }
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        let policy = QuorumPolicy::new(2, 0.5);
        assert!(!policy.evaluate(&window(&[0.5, 0.5])).is_reached());
    }

    #[test]
    fn test_zero_quorum_still_needs_contributions() {
        let policy = QuorumPolicy::new(0, 0.1);
        assert_eq!(policy.evaluate(&[]), QuorumDecision::NoQuorum { count: 0 });
    }

    proptest! {
        #[test]
        fn prop_emits_iff_quorum_and_threshold(
            confidences in prop::collection::vec(0.0f64..=1.0, 0..12),
            min_quorum in 1usize..8,
            threshold in 0.0f64..1.0,
        ) {
            let policy = QuorumPolicy::new(min_quorum, threshold);
            let contributions = window(&confidences);
            let expected = confidences.len() >= min_quorum
                && confidences.iter().sum::<f64>() / confidences.len() as f64 > threshold;
            prop_assert_eq!(policy.evaluate(&contributions).is_reached(), expected);
        }
    }
}
