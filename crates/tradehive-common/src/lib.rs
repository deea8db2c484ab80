//! # TradeHive Common
//!
//! Shared types and errors for the TradeHive agent population.
//!
//! ## Core Types
//!
//! - [`Agent`]: one simulated trading personality with evolving state
//! - [`LearningEvent`]/[`TradeOutcome`]: external observations fed to agents
//! - [`Contribution`]: an agent's chat-style confidence statement
//! - [`ConsensusSignal`]: aggregated recommendation emitted on quorum
//!
//! The constants below are the defaults every subsystem config falls back to.

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConsensusError, HiveError, LearningError, PopulationError, Result};
pub use types::{
    agent::{
        clamp_unit, Agent, AgentId, Capability, CommunicationStyle, LifecycleStatus,
        MarketCondition, Performance, Personality, RiskParams, Specialization, Timeframe,
    },
    consensus::{ConsensusSignal, Contribution, SignalDirection},
    learning_event::{EventPriority, LearningEvent, LearningEventType, TradeOutcome},
};

/// TradeHive version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Target population size
pub const DEFAULT_TARGET_POPULATION: usize = 5000;

/// Floor as a fraction of the target size
pub const DEFAULT_FLOOR_RATIO: f64 = 0.98;

/// Hard upper bound as a multiple of the target size
pub const DEFAULT_HARD_CAP_RATIO: f64 = 2.0;

/// Agents scoring below this are retirement-eligible
pub const RETIREMENT_THRESHOLD: f64 = 0.3;

/// Cycles an agent must survive before it can be retired
pub const GRACE_GENERATIONS: u64 = 1;

/// Trade count at which the fitness stability term saturates
pub const STABILITY_TRADES: u64 = 20;

/// Breeding pool size
pub const TOP_K: usize = 100;

/// Crossover children per cycle
pub const CROSSOVER_CHILDREN: usize = 10;

/// Evolution period in seconds
pub const EVOLUTION_INTERVAL_SECS: u64 = 300;

/// Learning queue capacity
pub const LEARNING_QUEUE_CAPACITY: usize = 1000;

/// Consensus sliding window in seconds
pub const CONSENSUS_WINDOW_SECS: u64 = 300;

/// Minimum contributions per window
pub const MIN_QUORUM: usize = 5;

/// Average confidence must exceed this
pub const CONSENSUS_THRESHOLD: f64 = 0.8;

/// Consensus history ring capacity
pub const CONSENSUS_HISTORY_CAPACITY: usize = 20;

/// Consensus period in seconds
pub const CONSENSUS_INTERVAL_SECS: u64 = 60;
