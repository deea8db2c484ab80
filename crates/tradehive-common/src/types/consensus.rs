//! Agent contributions and consensus signals

use crate::error::ConsensusError;
use crate::types::agent::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDirection {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalDirection::Buy => write!(f, "BUY"),
            SignalDirection::Sell => write!(f, "SELL"),
            SignalDirection::Hold => write!(f, "HOLD"),
        }
    }
}

/// Chat-style confidence statement produced by one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub agent_id: AgentId,
    pub direction: SignalDirection,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    pub message: String,
    /// Unix millis
    pub timestamp: i64,
}

impl Contribution {
    /// Create a contribution stamped now
    pub fn new(
        agent_id: AgentId,
        direction: SignalDirection,
        confidence: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            agent_id,
            direction,
            confidence,
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Override the timestamp
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn validate(&self) -> Result<(), ConsensusError> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConsensusError::ConfidenceOutOfRange(self.confidence));
        }
        Ok(())
    }
}

/// Aggregated recommendation; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusSignal {
    pub id: Uuid,
    pub direction: SignalDirection,
    /// Average confidence of the window, in `[0, 1]`
    pub confidence: f64,
    pub contributing_agent_ids: BTreeSet<AgentId>,
    pub reasoning: String,
    /// Unix millis
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contribution_validation() {
        let ok = Contribution::new(AgentId::new(), SignalDirection::Buy, 0.9, "breakout");
        assert!(ok.validate().is_ok());

        let bad = Contribution::new(AgentId::new(), SignalDirection::Sell, -0.1, "?");
        assert!(matches!(
            bad.validate(),
            Err(ConsensusError::ConfidenceOutOfRange(_))
        ));
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(SignalDirection::Buy.to_string(), "BUY");
        assert_eq!(SignalDirection::Hold.to_string(), "HOLD");
    }
}
