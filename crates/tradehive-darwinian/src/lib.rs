//! # Darwinian
//!
//! Population lifecycle engine for TradeHive.
//!
//! ## Fitness Formula
//!
//! ```text
//! η = win_rate × min(1, total_trades / 20)
//! ```
//!
//! Where:
//! - η: Fitness score (`overall_score`)
//! - win_rate: winning trades / total trades, 0 without trades
//! - the second factor damps agents with very few trades
//!
//! ## Retirement Policy
//!
//! Agents with fitness < 0.3 are retired once they have survived one full
//! cycle, never taking the population below its floor. Retired slots are
//! refilled by crossover of the top performers and by randomized agents.

pub mod breeding;
pub mod culling;
pub mod evolution;
pub mod fitness;
pub mod population;
pub mod telemetry;

pub use breeding::{archetypes, seed_population, Archetype, Breeder};
pub use culling::{Candidate, RetirementPolicy};
pub use evolution::{CycleOutcome, CycleReport, EvolutionConfig, EvolutionEngine};
pub use fitness::FitnessCalculator;
pub use population::{GlobalStats, PopulationDraft, PopulationSnapshot, PopulationStore};
pub use telemetry::EvolutionMetrics;
