//! # TradeHive
//!
//! Lifecycle manager for an evolving population of simulated trading agents.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       TradingHive                        │
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  Evolution  │  │   Learning   │  │    Consensus    │  │
//! │  │   Engine    │  │  Distributor │  │    Aggregator   │  │
//! │  └──────┬──────┘  └──────┬───────┘  └────────▲────────┘  │
//! │         │ mutate         │ update_agent      │           │
//! │  ┌──────┴────────────────┴───────┐  ┌────────┴────────┐  │
//! │  │        PopulationStore        │◄─┤    Sampler      │  │
//! │  └───────────────────────────────┘  └─────────────────┘  │
//! │               Scheduler (one task per job)               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every periodic job can also be driven by hand (`run_evolution_cycle`,
//! `run_consensus_cycle`, `distribute_pending`), which is how the tests run
//! them.

pub mod confidence;
pub mod config;
pub mod hive;
pub mod jobs;
pub mod persistence;
pub mod sampler;
pub mod scheduler;

pub use confidence::{Assessment, ConfidenceSource, RandomConfidence, ScriptedConfidence};
pub use config::HiveConfig;
pub use hive::TradingHive;
pub use persistence::{InMemorySnapshotStore, JsonFileStore, PopulationRecord, SnapshotStore};
pub use sampler::ContributionSampler;
pub use scheduler::{spawn_job, Job, JobHandle, Scheduler};

pub use tradehive_common::VERSION;
