//! Breeding module: crossover, randomized agents and archetype seeding
pub mod archetypes;
pub mod breeder;

pub use self::archetypes::{archetypes, seed_population, Archetype};
pub use self::breeder::Breeder;
