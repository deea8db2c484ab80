//! Core data types for TradeHive

pub mod agent;
pub mod consensus;
pub mod learning_event;
