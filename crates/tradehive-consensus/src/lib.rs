//! # Consensus
//!
//! Quorum-gated aggregation of agent contributions for TradeHive.
//!
//! ## Emission Rule
//!
//! ```text
//! emit  <=>  |window| >= min_quorum  AND  mean(confidence) > threshold
//! ```
//!
//! The window is the last `window_secs` of contributions. Emitted signals go
//! into a bounded history (oldest evicted first) and are never mutated.

pub mod aggregator;
pub mod contributions;
pub mod history;
pub mod quorum;

pub use aggregator::{
    plurality_direction, ConsensusAggregator, ConsensusConfig, ConsensusMetrics,
    ConsensusMetricsSnapshot,
};
pub use contributions::ContributionLog;
pub use history::SignalHistory;
pub use quorum::{QuorumDecision, QuorumPolicy};
