//! Error types for TradeHive
//!
//! Provides a unified error type and domain-specific error variants

use crate::types::agent::AgentId;
use thiserror::Error;

/// Result type alias using HiveError
pub type Result<T> = std::result::Result<T, HiveError>;

/// Unified error type for TradeHive operations
#[derive(Debug, Error)]
pub enum HiveError {
    // Population errors
    #[error("Population error: {0}")]
    Population(#[from] PopulationError),

    // Learning errors
    #[error("Learning error: {0}")]
    Learning(#[from] LearningError),

    // Consensus errors
    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Telemetry registration errors
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Population store and evolution errors
#[derive(Debug, Error)]
pub enum PopulationError {
    #[error("Population capacity exceeded: {size} agents > hard limit {limit}")]
    CapacityExceeded { size: usize, limit: usize },

    #[error("Duplicate agent id: {0}")]
    DuplicateAgent(AgentId),

    #[error("Agent {id} violates invariant: {reason}")]
    InvalidAgent { id: AgentId, reason: String },

    #[error("Agent not found: {0}")]
    NotFound(AgentId),

    #[error("Population below floor: {size} agents < floor {floor}")]
    BelowFloor { size: usize, floor: usize },
}

/// Learning event ingestion errors
#[derive(Debug, Error)]
pub enum LearningError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Confidence out of range: {0} (expected 0.0..=1.0)")]
    ConfidenceOutOfRange(f64),

    #[error("Invalid payload field {field}: {reason}")]
    InvalidPayload { field: &'static str, reason: String },
}

/// Consensus contribution errors
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("Contribution confidence out of range: {0}")]
    ConfidenceOutOfRange(f64),

    #[error("Contribution rejected: {0}")]
    InvalidContribution(String),
}

// Implement From for common external error types
impl From<serde_json::Error> for HiveError {
    fn from(err: serde_json::Error) -> Self {
        HiveError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for HiveError {
    fn from(err: std::io::Error) -> Self {
        HiveError::Storage(err.to_string())
    }
}

impl From<prometheus::Error> for HiveError {
    fn from(err: prometheus::Error) -> Self {
        HiveError::Telemetry(err.to_string())
    }
}

impl From<anyhow::Error> for HiveError {
    fn from(err: anyhow::Error) -> Self {
        HiveError::Internal(err.to_string())
    }
}
