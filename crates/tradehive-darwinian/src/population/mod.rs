//! Population module: the authoritative agent collection and its queries
pub mod stats;
pub mod store;

pub use self::stats::GlobalStats;
pub use self::store::{PopulationDraft, PopulationSnapshot, PopulationStore};
