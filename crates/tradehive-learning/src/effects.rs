//! Per-event-type effects on a single agent
//!
//! Effects only touch performance counters, the agent-private learning
//! confidence and, for trade outcomes, the fitness score. They run inside
//! `PopulationStore::update_agent`, which re-clamps personality traits
//! afterwards.

use rust_decimal::Decimal;
use tradehive_common::{clamp_unit, Agent, LearningEvent, LearningEventType, LifecycleStatus};
use tradehive_darwinian::FitnessCalculator;

/// Weight of a trade outcome on learning confidence, scaled by learning rate
pub const OUTCOME_WEIGHT: f64 = 0.1;

/// Weight of a session summary, scaled by adaptability
pub const SESSION_WEIGHT: f64 = 0.1;

/// Move `current` toward `target` by `rate`
fn nudge(current: f64, target: f64, rate: f64) -> f64 {
    clamp_unit(current + clamp_unit(rate) * (target - current))
}

/// Apply one learning event to an agent
pub fn apply_event(agent: &mut Agent, event: &LearningEvent, now_ms: i64) {
    let learning_rate = agent.personality.learning_rate;
    let perf = &mut agent.performance;

    match event.event_type {
        LearningEventType::Performance => {
            let success = event.success().unwrap_or(false);
            perf.record_trade(success, event.profit().unwrap_or(Decimal::ZERO));
            perf.overall_score = FitnessCalculator::default().calculate(perf);
            let target = if success { 1.0 } else { 0.0 };
            perf.confidence = nudge(perf.confidence, target, learning_rate * OUTCOME_WEIGHT);
        }
        LearningEventType::Pattern | LearningEventType::Screenshot => {
            perf.confidence = nudge(perf.confidence, event.confidence, learning_rate);
            perf.patterns_learned += 1;
        }
        LearningEventType::Transcript => {
            perf.confidence = nudge(perf.confidence, event.confidence, learning_rate / 2.0);
        }
        LearningEventType::Session => {
            perf.sessions_observed += 1;
            let rate = agent.personality.adaptability * SESSION_WEIGHT;
            perf.confidence = nudge(perf.confidence, event.confidence, rate);
        }
    }

    perf.last_learned_at = Some(now_ms);
    agent.status = LifecycleStatus::Learning;
}
