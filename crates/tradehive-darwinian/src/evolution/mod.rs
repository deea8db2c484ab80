//! Evolution module: the periodic evaluate/retire/breed/regenerate cycle
pub mod engine;

pub use self::engine::{CycleOutcome, CycleReport, EvolutionConfig, EvolutionEngine};
