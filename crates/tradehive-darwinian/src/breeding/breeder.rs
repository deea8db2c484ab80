//! Breeder - produces new agents by crossover or randomization
//!
//! The breeder owns its random source so a seeded breeder yields a
//! reproducible sequence of agents. The contract is statistical (ranges and
//! means), not bit-exact across rand versions.

use super::archetypes::Archetype;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use tradehive_common::{
    clamp_unit, Agent, Capability, CommunicationStyle, MarketCondition, Personality, RiskParams,
    Specialization, Timeframe,
};

/// Size range for randomly drawn capability and timeframe sets
pub const RANDOM_SET_SIZE: RangeInclusive<usize> = 2..=5;

/// Valid range for `max_positions`
pub const MAX_POSITIONS_RANGE: RangeInclusive<u32> = 1..=10;

/// Valid range for `risk_per_trade` (percent)
pub const RISK_PER_TRADE_RANGE: RangeInclusive<f64> = 0.25..=5.0;

/// Valid range for `average_hold_time_secs` (one minute to one week)
pub const HOLD_TIME_RANGE: RangeInclusive<u64> = 60..=604_800;

/// Valid range for `win_rate_target`
pub const WIN_RATE_TARGET_RANGE: RangeInclusive<f64> = 0.35..=0.75;

/// Descriptive tags randomized agents draw from
const TAG_POOL: [&str; 12] = [
    "disciplined",
    "impulsive",
    "methodical",
    "opportunistic",
    "skeptical",
    "optimistic",
    "patient",
    "restless",
    "data-driven",
    "intuitive",
    "independent",
    "collaborative",
];

pub struct Breeder {
    rng: StdRng,
    sequence: u64,
}

impl Breeder {
    /// Reproducible breeder
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sequence: 0,
        }
    }

    /// Breeder seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            sequence: 0,
        }
    }

    /// Access the random source (used for pairing and sampling)
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn next_name(&mut self, specialization: Specialization) -> String {
        self.sequence += 1;
        format!("{}-{:05}", specialization.label(), self.sequence)
    }

    /// Two-parent crossover
    ///
    /// Numeric traits and risk parameters are averaged, sets are unioned and
    /// single-valued categories are picked from either parent at random.
    pub fn crossover(&mut self, a: &Agent, b: &Agent, generation: u64) -> Agent {
        let va = a.personality.values();
        let vb = b.personality.values();
        let mut values = [0.0; Personality::TRAIT_COUNT];
        for (i, v) in values.iter_mut().enumerate() {
            *v = clamp_unit((va[i] + vb[i]) / 2.0);
        }

        let specialization = if self.rng.gen_bool(0.5) {
            a.specialization
        } else {
            b.specialization
        };
        let communication_style = if self.rng.gen_bool(0.5) {
            a.personality.communication_style
        } else {
            b.personality.communication_style
        };

        let personality = build_personality(
            values,
            a.personality.tags.union(&b.personality.tags).cloned().collect(),
            communication_style,
            a.personality
                .preferred_conditions
                .union(&b.personality.preferred_conditions)
                .copied()
                .collect(),
        );

        let risk = RiskParams {
            max_positions: (((a.risk.max_positions + b.risk.max_positions) as f64) / 2.0)
                .round()
                .max(1.0) as u32,
            risk_per_trade: (a.risk.risk_per_trade + b.risk.risk_per_trade) / 2.0,
            average_hold_time_secs: ((a.risk.average_hold_time_secs as f64
                + b.risk.average_hold_time_secs as f64)
                / 2.0)
                .round() as u64,
            win_rate_target: (a.risk.win_rate_target + b.risk.win_rate_target) / 2.0,
        };

        let name = self.next_name(specialization);
        Agent::new(
            name,
            specialization,
            personality,
            a.capabilities.union(&b.capabilities).copied().collect(),
            a.timeframes.union(&b.timeframes).copied().collect(),
            risk,
            generation,
        )
        .with_parents(a.id, b.id)
    }

    /// Agent with every attribute drawn uniformly from its valid range
    pub fn random_agent(&mut self, generation: u64) -> Agent {
        let specialization = *Specialization::ALL
            .choose(&mut self.rng)
            .unwrap_or(&Specialization::Swing);
        let communication_style = *CommunicationStyle::ALL
            .choose(&mut self.rng)
            .unwrap_or(&CommunicationStyle::Analytical);

        let mut values = [0.0; Personality::TRAIT_COUNT];
        for v in values.iter_mut() {
            *v = self.rng.gen_range(0.0..=1.0);
        }

        let tag_count = self.rng.gen_range(2..=3);
        let tags = TAG_POOL
            .choose_multiple(&mut self.rng, tag_count)
            .map(|t| t.to_string())
            .collect();
        let condition_count = self.rng.gen_range(1..=3);
        let preferred_conditions = self.subset(&MarketCondition::ALL, condition_count);

        let personality = build_personality(values, tags, communication_style, preferred_conditions);

        let capability_count = self.rng.gen_range(RANDOM_SET_SIZE);
        let capabilities = self.subset(&Capability::ALL, capability_count);
        let timeframe_count = self.rng.gen_range(RANDOM_SET_SIZE);
        let timeframes = self.subset(&Timeframe::ALL, timeframe_count);

        let risk = RiskParams {
            max_positions: self.rng.gen_range(MAX_POSITIONS_RANGE),
            risk_per_trade: self.rng.gen_range(RISK_PER_TRADE_RANGE),
            average_hold_time_secs: self.rng.gen_range(HOLD_TIME_RANGE),
            win_rate_target: self.rng.gen_range(WIN_RATE_TARGET_RANGE),
        };

        let name = self.next_name(specialization);
        Agent::new(
            name,
            specialization,
            personality,
            capabilities,
            timeframes,
            risk,
            generation,
        )
    }

    /// Replicate an archetype with uniform `±spread` trait jitter
    pub fn from_archetype(&mut self, archetype: &Archetype, spread: f64) -> Agent {
        let mut values = archetype.traits;
        if spread > 0.0 {
            for v in values.iter_mut() {
                *v += self.rng.gen_range(-spread..=spread);
            }
        }

        let personality = build_personality(
            values,
            archetype.tags.iter().map(|t| t.to_string()).collect(),
            archetype.communication_style,
            archetype.preferred_conditions.iter().copied().collect(),
        );

        let name = self.next_name(archetype.specialization);
        Agent::new(
            name,
            archetype.specialization,
            personality,
            archetype.capabilities.iter().copied().collect(),
            archetype.timeframes.iter().copied().collect(),
            archetype.risk.clone(),
            0,
        )
    }

    /// Two distinct indices in `0..len`, or None when `len < 2`
    pub fn pick_pair(&mut self, len: usize) -> Option<(usize, usize)> {
        if len < 2 {
            return None;
        }
        let first = self.rng.gen_range(0..len);
        let mut second = self.rng.gen_range(0..len - 1);
        if second >= first {
            second += 1;
        }
        Some((first, second))
    }

    fn subset<T: Copy + Ord>(&mut self, universe: &[T], count: usize) -> BTreeSet<T> {
        universe
            .choose_multiple(&mut self.rng, count.clamp(1, universe.len()))
            .copied()
            .collect()
    }
}

fn build_personality(
    values: [f64; Personality::TRAIT_COUNT],
    tags: BTreeSet<String>,
    communication_style: CommunicationStyle,
    preferred_conditions: BTreeSet<MarketCondition>,
) -> Personality {
    let mut personality = Personality {
        aggressiveness: 0.0,
        patience: 0.0,
        risk_tolerance: 0.0,
        adaptability: 0.0,
        analytical_depth: 0.0,
        emotional_control: 0.0,
        decision_speed: 0.0,
        learning_rate: 0.0,
        tags,
        communication_style,
        preferred_conditions,
    };
    personality.set_values(values);
    personality
}
