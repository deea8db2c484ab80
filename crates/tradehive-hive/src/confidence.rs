//! Confidence sources
//!
//! Where an agent's view of the market comes from. Production uses a
//! personality-biased random source; tests inject a scripted one.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tradehive_common::{clamp_unit, Agent, Result, SignalDirection};

/// One agent's current view
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub direction: SignalDirection,
    pub confidence: f64,
    pub message: String,
}

impl Assessment {
    pub fn new(direction: SignalDirection, confidence: f64, message: impl Into<String>) -> Self {
        Self {
            direction,
            confidence,
            message: message.into(),
        }
    }
}

/// Supplies assessments for agents
#[async_trait]
pub trait ConfidenceSource: Send + Sync {
    async fn assess(&self, agent: &Agent) -> Result<Assessment>;
}

/// Random assessments biased by personality and learning confidence
pub struct RandomConfidence {
    rng: Mutex<StdRng>,
}

impl RandomConfidence {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

#[async_trait]
impl ConfidenceSource for RandomConfidence {
    async fn assess(&self, agent: &Agent) -> Result<Assessment> {
        let (roll, base) = {
            let mut rng = self.rng.lock();
            (rng.gen_range(0.0..1.0), rng.gen_range(0.4..=1.0))
        };

        let p = &agent.personality;
        // patient, cautious agents sit out more often
        let hold_chance = 0.15 + 0.35 * (1.0 - p.aggressiveness) * p.patience;
        let direction = if roll < hold_chance {
            SignalDirection::Hold
        } else if roll < hold_chance + (1.0 - hold_chance) / 2.0 {
            SignalDirection::Buy
        } else {
            SignalDirection::Sell
        };

        let confidence = clamp_unit(
            0.6 * base + 0.25 * agent.performance.confidence + 0.15 * p.emotional_control,
        );
        let message = format!(
            "{} leans {} with {:.0}% confidence",
            agent.name,
            direction,
            confidence * 100.0
        );
        Ok(Assessment::new(direction, confidence, message))
    }
}

/// Deterministic source: replays a script, then repeats a fallback
pub struct ScriptedConfidence {
    script: Mutex<VecDeque<Assessment>>,
    fallback: Assessment,
}

impl ScriptedConfidence {
    pub fn new(script: Vec<Assessment>, fallback: Assessment) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
        }
    }

    /// Every agent always reports the same view
    pub fn constant(direction: SignalDirection, confidence: f64) -> Self {
        Self::new(Vec::new(), Assessment::new(direction, confidence, "scripted"))
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl ConfidenceSource for ScriptedConfidence {
    async fn assess(&self, _agent: &Agent) -> Result<Assessment> {
        Ok(self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradehive_darwinian::Breeder;

    #[tokio::test]
    async fn test_random_confidence_in_range() {
        let source = RandomConfidence::seeded(5);
        let mut breeder = Breeder::seeded(5);
        for _ in 0..200 {
            let agent = breeder.random_agent(0);
            let a = source.assess(&agent).await.unwrap();
            assert!((0.0..=1.0).contains(&a.confidence));
            assert!(a.message.contains(&agent.name));
        }
    }

    #[tokio::test]
    async fn test_seeded_sources_agree() {
        let agent = Breeder::seeded(1).random_agent(0);
        let a = RandomConfidence::seeded(9);
        let b = RandomConfidence::seeded(9);
        for _ in 0..10 {
            assert_eq!(a.assess(&agent).await.unwrap(), b.assess(&agent).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_scripted_replays_then_falls_back() {
        let agent = Breeder::seeded(2).random_agent(0);
        let source = ScriptedConfidence::new(
            vec![
                Assessment::new(SignalDirection::Buy, 0.9, "one"),
                Assessment::new(SignalDirection::Sell, 0.7, "two"),
            ],
            Assessment::new(SignalDirection::Hold, 0.1, "rest"),
        );

        assert_eq!(source.assess(&agent).await.unwrap().message, "one");
        assert_eq!(source.assess(&agent).await.unwrap().message, "two");
        assert_eq!(source.remaining(), 0);
        assert_eq!(source.assess(&agent).await.unwrap().direction, SignalDirection::Hold);
    }
}
