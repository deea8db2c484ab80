//! # Learning
//!
//! Learning event ingestion and distribution for TradeHive.
//!
//! ## Flow
//!
//! ```text
//! producer -> submit (validate) -> bounded queue -> distribute_pending
//!          -> route (capabilities | broadcast | explicit ids)
//!          -> PopulationStore::update_agent per target
//! ```
//!
//! Delivery is best-effort: an agent retired between routing and delivery is
//! skipped silently.

pub mod distributor;
pub mod effects;
pub mod queue;
pub mod routing;

pub use distributor::{
    DistributionReport, DistributorConfig, DistributorMetrics, DistributorMetricsSnapshot,
    LearningDistributor,
};
pub use effects::apply_event;
pub use queue::LearningQueue;
pub use routing::{Route, PATTERN_CAPABILITIES, TRANSCRIPT_CAPABILITIES};
