//! Fitness module
pub mod calculator;

pub use self::calculator::FitnessCalculator;
