//! Hand-authored archetypes used to seed generation 0
//!
//! One archetype per specialization. Seeding replicates them round-robin
//! with a small uniform jitter on every personality trait.

use super::breeder::Breeder;
use tradehive_common::{
    Agent, Capability, CommunicationStyle, MarketCondition, RiskParams, Specialization, Timeframe,
};

/// Default trait jitter applied when replicating archetypes
pub const SEED_JITTER: f64 = 0.05;

/// Template for a seeded agent
#[derive(Debug, Clone)]
pub struct Archetype {
    pub specialization: Specialization,
    /// Traits in `Personality::values` order
    pub traits: [f64; 8],
    pub tags: &'static [&'static str],
    pub communication_style: CommunicationStyle,
    pub preferred_conditions: &'static [MarketCondition],
    pub capabilities: &'static [Capability],
    pub timeframes: &'static [Timeframe],
    pub risk: RiskParams,
}

fn risk(max_positions: u32, risk_per_trade: f64, hold_secs: u64, win_rate_target: f64) -> RiskParams {
    RiskParams {
        max_positions,
        risk_per_trade,
        average_hold_time_secs: hold_secs,
        win_rate_target,
    }
}

/// The nine seed archetypes
pub fn archetypes() -> Vec<Archetype> {
    use Capability::*;
    use MarketCondition::*;
    use Timeframe::*;

    vec![
        Archetype {
            specialization: Specialization::Scalping,
            traits: [0.85, 0.20, 0.70, 0.80, 0.50, 0.65, 0.95, 0.70],
            tags: &["fast", "decisive", "restless"],
            communication_style: CommunicationStyle::Concise,
            preferred_conditions: &[Volatile, HighVolume],
            capabilities: &[PriceAction, OrderFlow, VolumeAnalysis],
            timeframes: &[M1, M5],
            risk: risk(5, 0.5, 300, 0.60),
        },
        Archetype {
            specialization: Specialization::Swing,
            traits: [0.50, 0.80, 0.55, 0.60, 0.70, 0.75, 0.40, 0.60],
            tags: &["patient", "methodical"],
            communication_style: CommunicationStyle::Analytical,
            preferred_conditions: &[Trending, Breakout],
            capabilities: &[PriceAction, ChartPatterns, Momentum],
            timeframes: &[H4, D1],
            risk: risk(3, 1.5, 259_200, 0.55),
        },
        Archetype {
            specialization: Specialization::Institutional,
            traits: [0.35, 0.90, 0.40, 0.50, 0.90, 0.90, 0.30, 0.50],
            tags: &["disciplined", "data-driven"],
            communication_style: CommunicationStyle::Analytical,
            preferred_conditions: &[Trending, HighVolume],
            capabilities: &[OrderFlow, VolumeAnalysis, Fundamentals],
            timeframes: &[D1, W1],
            risk: risk(2, 1.0, 604_800, 0.50),
        },
        Archetype {
            specialization: Specialization::Contrarian,
            traits: [0.65, 0.70, 0.75, 0.55, 0.70, 0.80, 0.50, 0.55],
            tags: &["skeptical", "independent"],
            communication_style: CommunicationStyle::Provocative,
            preferred_conditions: &[Reversal, Ranging],
            capabilities: &[MeanReversion, Sentiment, MarketPsychology],
            timeframes: &[H1, H4],
            risk: risk(2, 1.25, 43_200, 0.45),
        },
        Archetype {
            specialization: Specialization::News,
            traits: [0.75, 0.30, 0.65, 0.85, 0.55, 0.60, 0.90, 0.75],
            tags: &["opportunistic", "alert"],
            communication_style: CommunicationStyle::Assertive,
            preferred_conditions: &[NewsDriven, Volatile],
            capabilities: &[NewsAnalysis, Sentiment, Fundamentals],
            timeframes: &[M5, M15],
            risk: risk(3, 1.0, 1_800, 0.55),
        },
        Archetype {
            specialization: Specialization::Sentiment,
            traits: [0.55, 0.55, 0.50, 0.75, 0.60, 0.55, 0.60, 0.80],
            tags: &["intuitive", "collaborative"],
            communication_style: CommunicationStyle::Narrative,
            preferred_conditions: &[NewsDriven, Trending],
            capabilities: &[Sentiment, MarketPsychology, NewsAnalysis],
            timeframes: &[M15, H1],
            risk: risk(3, 0.75, 7_200, 0.55),
        },
        Archetype {
            specialization: Specialization::Patterns,
            traits: [0.45, 0.75, 0.50, 0.65, 0.85, 0.70, 0.45, 0.70],
            tags: &["methodical", "visual"],
            communication_style: CommunicationStyle::Analytical,
            preferred_conditions: &[Breakout, Reversal],
            capabilities: &[ChartPatterns, PatternRecognition, PriceAction],
            timeframes: &[M15, H1, H4],
            risk: risk(3, 1.0, 14_400, 0.58),
        },
        Archetype {
            specialization: Specialization::RiskManagement,
            traits: [0.15, 0.85, 0.15, 0.55, 0.80, 0.95, 0.40, 0.55],
            tags: &["cautious", "disciplined"],
            communication_style: CommunicationStyle::Cautious,
            preferred_conditions: &[Calm, Ranging],
            capabilities: &[RiskAssessment, VolumeAnalysis],
            timeframes: &[H1, D1],
            risk: risk(1, 0.25, 86_400, 0.65),
        },
        Archetype {
            specialization: Specialization::Psychology,
            traits: [0.40, 0.70, 0.45, 0.80, 0.65, 0.90, 0.50, 0.75],
            tags: &["empathetic", "reflective"],
            communication_style: CommunicationStyle::Narrative,
            preferred_conditions: &[Volatile, Reversal],
            capabilities: &[MarketPsychology, Sentiment],
            timeframes: &[H1, H4],
            risk: risk(2, 0.75, 21_600, 0.55),
        },
    ]
}

/// Seed `target` agents by replicating the archetypes round-robin
pub fn seed_population(breeder: &mut Breeder, target: usize) -> Vec<Agent> {
    let templates = archetypes();
    (0..target)
        .map(|i| breeder.from_archetype(&templates[i % templates.len()], SEED_JITTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_one_archetype_per_specialization() {
        let specs: HashSet<_> = archetypes().iter().map(|a| a.specialization).collect();
        assert_eq!(specs.len(), Specialization::ALL.len());
    }

    #[test]
    fn test_seed_population() {
        let mut breeder = Breeder::seeded(21);
        let agents = seed_population(&mut breeder, 90);

        assert_eq!(agents.len(), 90);
        let ids: HashSet<_> = agents.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), 90);

        for agent in &agents {
            assert_eq!(agent.generation, 0);
            assert!(agent.validate().is_ok());
        }

        let scalpers = agents
            .iter()
            .filter(|a| a.specialization == Specialization::Scalping)
            .count();
        assert_eq!(scalpers, 10);
    }

    #[test]
    fn test_seed_jitter_is_small() {
        let mut breeder = Breeder::seeded(8);
        let template = &archetypes()[0];
        for _ in 0..100 {
            let agent = breeder.from_archetype(template, SEED_JITTER);
            for (got, base) in agent.personality.values().iter().zip(template.traits.iter()) {
                assert!((got - base).abs() <= SEED_JITTER + 1e-12);
            }
        }
    }
}
