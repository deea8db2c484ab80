//! LearningEvent - external observation fed into the population
//!
//! Events are created by external producers (screenshot analysis, session
//! transcripts, trade outcomes), validated at the ingestion boundary, queued,
//! distributed once and then discarded.

use crate::error::LearningError;
use crate::types::agent::AgentId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use uuid::Uuid;

/// Payload key carrying the trade result flag
pub const PAYLOAD_SUCCESS: &str = "success";
/// Payload key carrying the realized profit (decimal string)
pub const PAYLOAD_PROFIT: &str = "profit";
/// Payload key carrying the originating signal reasoning
pub const PAYLOAD_REASONING: &str = "reasoning";
/// Payload key carrying the agents credited with a trade
pub const PAYLOAD_AGENT_IDS: &str = "agent_ids";

/// Learning event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningEventType {
    /// Chart pattern observation
    Pattern,
    /// Chart screenshot analysis
    Screenshot,
    /// Video or session transcript
    Transcript,
    /// Trading session summary
    Session,
    /// Closed-trade outcome
    Performance,
}

impl std::fmt::Display for LearningEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LearningEventType::Pattern => write!(f, "pattern"),
            LearningEventType::Screenshot => write!(f, "screenshot"),
            LearningEventType::Transcript => write!(f, "transcript"),
            LearningEventType::Session => write!(f, "session"),
            LearningEventType::Performance => write!(f, "performance"),
        }
    }
}

/// Event priority, informational
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPriority {
    Low,
    Normal,
    High,
    Critical,
}

/// External observation routed to interested agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEvent {
    /// Unique event ID
    pub id: Uuid,
    pub event_type: LearningEventType,
    /// Opaque key/value data
    pub payload: Map<String, Value>,
    /// Producer confidence in `[0, 1]`
    pub confidence: f64,
    pub priority: EventPriority,
    /// Producer identifier
    pub source: String,
    /// Creation timestamp (Unix millis)
    pub timestamp: i64,
}

impl LearningEvent {
    /// Create a new event with empty payload and neutral confidence
    pub fn new(event_type: LearningEventType, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type,
            payload: Map::new(),
            confidence: 0.5,
            priority: EventPriority::Normal,
            source: source.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Add a payload entry
    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Set producer confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set priority
    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set timestamp
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Validate the event at the ingestion boundary
    pub fn validate(&self) -> Result<(), LearningError> {
        if self.source.trim().is_empty() {
            return Err(LearningError::MissingField("source"));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(LearningError::ConfidenceOutOfRange(self.confidence));
        }

        if self.event_type == LearningEventType::Performance {
            match self.payload.get(PAYLOAD_SUCCESS) {
                None => return Err(LearningError::MissingField(PAYLOAD_SUCCESS)),
                Some(Value::Bool(_)) => {}
                Some(other) => {
                    return Err(LearningError::InvalidPayload {
                        field: PAYLOAD_SUCCESS,
                        reason: format!("expected bool, got {}", other),
                    })
                }
            }
        }

        if self.payload.contains_key(PAYLOAD_PROFIT) && self.profit().is_none() {
            return Err(LearningError::InvalidPayload {
                field: PAYLOAD_PROFIT,
                reason: "not a decimal number".into(),
            });
        }

        if let Some(ids) = self.payload.get(PAYLOAD_AGENT_IDS) {
            serde_json::from_value::<Vec<AgentId>>(ids.clone()).map_err(|e| {
                LearningError::InvalidPayload {
                    field: PAYLOAD_AGENT_IDS,
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(())
    }

    /// Trade success flag, for performance events
    pub fn success(&self) -> Option<bool> {
        self.payload.get(PAYLOAD_SUCCESS).and_then(Value::as_bool)
    }

    /// Realized profit; accepts decimal strings and JSON numbers
    pub fn profit(&self) -> Option<Decimal> {
        match self.payload.get(PAYLOAD_PROFIT)? {
            Value::String(s) => Decimal::from_str(s).ok(),
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            _ => None,
        }
    }

    /// Agents explicitly targeted by this event (empty means no targeting)
    pub fn target_agents(&self) -> Vec<AgentId> {
        self.payload
            .get(PAYLOAD_AGENT_IDS)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

/// Closed-trade outcome reported by the execution layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub success: bool,
    pub profit: Decimal,
    /// Confidence of the signal that opened the trade
    pub signal_confidence: f64,
    /// Reasoning of the signal that opened the trade
    pub reasoning: String,
    /// Agents credited with the trade; empty broadcasts to everyone
    pub agent_ids: Vec<AgentId>,
    pub source: String,
}

impl TradeOutcome {
    /// Convert into a performance learning event
    pub fn into_event(self) -> LearningEvent {
        let mut event = LearningEvent::new(LearningEventType::Performance, self.source)
            .with_confidence(self.signal_confidence)
            .with_priority(EventPriority::High)
            .with_payload(PAYLOAD_SUCCESS, self.success)
            .with_payload(PAYLOAD_PROFIT, self.profit.to_string())
            .with_payload(PAYLOAD_REASONING, self.reasoning);

        if !self.agent_ids.is_empty() {
            let ids = serde_json::to_value(&self.agent_ids).unwrap_or(Value::Null);
            event = event.with_payload(PAYLOAD_AGENT_IDS, ids);
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_builder() {
        let event = LearningEvent::new(LearningEventType::Pattern, "screenshot-analyzer")
            .with_confidence(0.8)
            .with_payload("pattern", "double-bottom");

        assert_eq!(event.event_type, LearningEventType::Pattern);
        assert_eq!(event.payload["pattern"], "double-bottom");
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_validation_requires_source() {
        let event = LearningEvent::new(LearningEventType::Session, "  ");
        assert!(matches!(
            event.validate(),
            Err(LearningError::MissingField("source"))
        ));
    }

    #[test]
    fn test_validation_rejects_confidence() {
        let event = LearningEvent::new(LearningEventType::Session, "feed").with_confidence(1.2);
        assert!(matches!(
            event.validate(),
            Err(LearningError::ConfidenceOutOfRange(_))
        ));

        let event = LearningEvent::new(LearningEventType::Session, "feed").with_confidence(f64::NAN);
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_performance_requires_success_flag() {
        let event = LearningEvent::new(LearningEventType::Performance, "broker");
        assert!(matches!(
            event.validate(),
            Err(LearningError::MissingField(PAYLOAD_SUCCESS))
        ));

        let event = event.with_payload(PAYLOAD_SUCCESS, "yes");
        assert!(matches!(
            event.validate(),
            Err(LearningError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_trade_outcome_into_event() {
        let a = AgentId::new();
        let b = AgentId::new();
        let outcome = TradeOutcome {
            success: true,
            profit: dec!(42.50),
            signal_confidence: 0.86,
            reasoning: "5 agents agreed".into(),
            agent_ids: vec![a, b],
            source: "executor".into(),
        };

        let event = outcome.into_event();
        assert!(event.validate().is_ok());
        assert_eq!(event.event_type, LearningEventType::Performance);
        assert_eq!(event.success(), Some(true));
        assert_eq!(event.profit(), Some(dec!(42.50)));
        assert_eq!(event.target_agents(), vec![a, b]);
        assert!((event.confidence - 0.86).abs() < f64::EPSILON);
    }

    #[test]
    fn test_profit_accepts_numbers() {
        let event = LearningEvent::new(LearningEventType::Performance, "broker")
            .with_payload(PAYLOAD_SUCCESS, false)
            .with_payload(PAYLOAD_PROFIT, -3.25);
        assert_eq!(event.profit(), Some(dec!(-3.25)));
    }
}
