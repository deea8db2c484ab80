//! Retirement (culling) module
pub mod policy;

pub use self::policy::{Candidate, RetirementPolicy};
