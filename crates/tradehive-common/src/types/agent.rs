//! Agent - a single simulated trading personality
//!
//! An agent has an immutable identity and heritable profile (specialization,
//! personality, capabilities, timeframes, risk parameters) plus mutable
//! performance state updated by learning events. Agents are only ever
//! mutated through the population store.

use crate::error::PopulationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique agent identifier (UUID v7, time-ordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(Uuid);

impl AgentId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Trading-style category, fixed for the lifetime of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Specialization {
    Scalping,
    Swing,
    Institutional,
    Contrarian,
    News,
    Sentiment,
    Patterns,
    RiskManagement,
    Psychology,
}

impl Specialization {
    pub const ALL: [Specialization; 9] = [
        Specialization::Scalping,
        Specialization::Swing,
        Specialization::Institutional,
        Specialization::Contrarian,
        Specialization::News,
        Specialization::Sentiment,
        Specialization::Patterns,
        Specialization::RiskManagement,
        Specialization::Psychology,
    ];

    /// Short label used in agent names
    pub fn label(&self) -> &'static str {
        match self {
            Specialization::Scalping => "Scalper",
            Specialization::Swing => "Swing",
            Specialization::Institutional => "Institutional",
            Specialization::Contrarian => "Contrarian",
            Specialization::News => "News",
            Specialization::Sentiment => "Sentiment",
            Specialization::Patterns => "Pattern",
            Specialization::RiskManagement => "Risk",
            Specialization::Psychology => "Psych",
        }
    }
}

impl std::fmt::Display for Specialization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Specialization::Scalping => "scalping",
            Specialization::Swing => "swing",
            Specialization::Institutional => "institutional",
            Specialization::Contrarian => "contrarian",
            Specialization::News => "news",
            Specialization::Sentiment => "sentiment",
            Specialization::Patterns => "patterns",
            Specialization::RiskManagement => "risk-management",
            Specialization::Psychology => "psychology",
        };
        write!(f, "{}", s)
    }
}

/// Learning capability tag; drives learning event routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    PriceAction,
    ChartPatterns,
    PatternRecognition,
    Sentiment,
    NewsAnalysis,
    MarketPsychology,
    OrderFlow,
    VolumeAnalysis,
    RiskAssessment,
    Fundamentals,
    Momentum,
    MeanReversion,
}

impl Capability {
    pub const ALL: [Capability; 12] = [
        Capability::PriceAction,
        Capability::ChartPatterns,
        Capability::PatternRecognition,
        Capability::Sentiment,
        Capability::NewsAnalysis,
        Capability::MarketPsychology,
        Capability::OrderFlow,
        Capability::VolumeAnalysis,
        Capability::RiskAssessment,
        Capability::Fundamentals,
        Capability::Momentum,
        Capability::MeanReversion,
    ];
}

/// Chart timeframe an agent operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    H1,
    H4,
    D1,
    W1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
    ];
}

/// Market regime an agent prefers to trade in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketCondition {
    Trending,
    Ranging,
    Volatile,
    Calm,
    Breakout,
    Reversal,
    HighVolume,
    NewsDriven,
}

impl MarketCondition {
    pub const ALL: [MarketCondition; 8] = [
        MarketCondition::Trending,
        MarketCondition::Ranging,
        MarketCondition::Volatile,
        MarketCondition::Calm,
        MarketCondition::Breakout,
        MarketCondition::Reversal,
        MarketCondition::HighVolume,
        MarketCondition::NewsDriven,
    ];
}

/// How an agent phrases its contributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationStyle {
    Analytical,
    Assertive,
    Cautious,
    Provocative,
    Concise,
    Narrative,
}

impl CommunicationStyle {
    pub const ALL: [CommunicationStyle; 6] = [
        CommunicationStyle::Analytical,
        CommunicationStyle::Assertive,
        CommunicationStyle::Cautious,
        CommunicationStyle::Provocative,
        CommunicationStyle::Concise,
        CommunicationStyle::Narrative,
    ];
}

/// Personality vector plus descriptive attributes
///
/// All eight numeric traits live in `[0, 1]`. Anything that writes to them
/// must call [`Personality::clamp`] afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub aggressiveness: f64,
    pub patience: f64,
    pub risk_tolerance: f64,
    pub adaptability: f64,
    pub analytical_depth: f64,
    pub emotional_control: f64,
    pub decision_speed: f64,
    pub learning_rate: f64,
    /// Free-form descriptive tags ("disciplined", "impulsive", ...)
    pub tags: BTreeSet<String>,
    pub communication_style: CommunicationStyle,
    pub preferred_conditions: BTreeSet<MarketCondition>,
}

impl Personality {
    /// Number of numeric traits
    pub const TRAIT_COUNT: usize = 8;

    /// Trait names in [`Personality::values`] order
    pub const TRAIT_NAMES: [&'static str; 8] = [
        "aggressiveness",
        "patience",
        "risk_tolerance",
        "adaptability",
        "analytical_depth",
        "emotional_control",
        "decision_speed",
        "learning_rate",
    ];

    /// Numeric traits as an array
    pub fn values(&self) -> [f64; 8] {
        [
            self.aggressiveness,
            self.patience,
            self.risk_tolerance,
            self.adaptability,
            self.analytical_depth,
            self.emotional_control,
            self.decision_speed,
            self.learning_rate,
        ]
    }

    /// Overwrite the numeric traits (clamped)
    pub fn set_values(&mut self, values: [f64; 8]) {
        let [a, p, r, ad, an, e, d, l] = values;
        self.aggressiveness = a;
        self.patience = p;
        self.risk_tolerance = r;
        self.adaptability = ad;
        self.analytical_depth = an;
        self.emotional_control = e;
        self.decision_speed = d;
        self.learning_rate = l;
        self.clamp();
    }

    /// Clamp every numeric trait into `[0, 1]`; NaN collapses to 0
    pub fn clamp(&mut self) {
        for value in [
            &mut self.aggressiveness,
            &mut self.patience,
            &mut self.risk_tolerance,
            &mut self.adaptability,
            &mut self.analytical_depth,
            &mut self.emotional_control,
            &mut self.decision_speed,
            &mut self.learning_rate,
        ] {
            *value = clamp_unit(*value);
        }
    }

    /// Check every numeric trait is inside `[0, 1]`
    pub fn is_within_bounds(&self) -> bool {
        self.values().iter().all(|v| (0.0..=1.0).contains(v))
    }
}

/// Clamp into `[0, 1]`, mapping NaN to 0
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Risk parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskParams {
    /// Maximum concurrent positions (>= 1)
    pub max_positions: u32,
    /// Risk per trade, percent of balance (> 0)
    pub risk_per_trade: f64,
    /// Average hold time in seconds
    pub average_hold_time_secs: u64,
    /// Target win rate, exclusive (0, 1)
    pub win_rate_target: f64,
}

/// Mutable performance counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub total_trades: u64,
    pub winning_trades: u64,
    /// Fitness, derived by the fitness calculator
    pub overall_score: f64,
    pub total_profit: Decimal,
    /// Agent-private learning confidence in `[0, 1]`
    pub confidence: f64,
    pub patterns_learned: u64,
    pub sessions_observed: u64,
    /// Last learning update (Unix millis)
    pub last_learned_at: Option<i64>,
}

impl Default for Performance {
    fn default() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            overall_score: 0.0,
            total_profit: Decimal::ZERO,
            confidence: 0.5,
            patterns_learned: 0,
            sessions_observed: 0,
            last_learned_at: None,
        }
    }
}

impl Performance {
    /// Winning trades over total trades; 0 when no trades
    #[inline]
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.winning_trades as f64 / self.total_trades as f64
    }

    /// Record one closed trade
    pub fn record_trade(&mut self, success: bool, profit: Decimal) {
        self.total_trades += 1;
        if success {
            self.winning_trades += 1;
        }
        self.total_profit += profit;
    }
}

/// Informational lifecycle status; never gates mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Active,
    Learning,
    Trading,
    Retired,
}

/// A simulated trading agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub specialization: Specialization,
    pub personality: Personality,
    pub capabilities: BTreeSet<Capability>,
    pub timeframes: BTreeSet<Timeframe>,
    pub risk: RiskParams,
    pub performance: Performance,
    pub status: LifecycleStatus,
    /// Toggled by activate/deactivate
    pub active: bool,
    /// Evolution cycle that produced this agent (0 for seeded archetypes)
    pub generation: u64,
    /// Crossover parents, empty for seeded and randomized agents
    pub parents: Vec<AgentId>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
}

impl Agent {
    /// Create an agent with fresh identity and zeroed performance
    pub fn new(
        name: String,
        specialization: Specialization,
        personality: Personality,
        capabilities: BTreeSet<Capability>,
        timeframes: BTreeSet<Timeframe>,
        risk: RiskParams,
        generation: u64,
    ) -> Self {
        Self {
            id: AgentId::new(),
            name,
            specialization,
            personality,
            capabilities,
            timeframes,
            risk,
            performance: Performance::default(),
            status: LifecycleStatus::Active,
            active: true,
            generation,
            parents: Vec::new(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Record the crossover parents
    pub fn with_parents(mut self, a: AgentId, b: AgentId) -> Self {
        self.parents = vec![a, b];
        self
    }

    /// Whether the agent has any capability in `wanted`
    pub fn has_any_capability(&self, wanted: &[Capability]) -> bool {
        wanted.iter().any(|c| self.capabilities.contains(c))
    }

    /// Check the data-model invariants
    pub fn validate(&self) -> Result<(), PopulationError> {
        let fail = |reason: &str| PopulationError::InvalidAgent {
            id: self.id,
            reason: reason.to_string(),
        };

        if !self.personality.is_within_bounds() {
            return Err(fail("personality trait outside [0, 1]"));
        }
        if self.capabilities.is_empty() {
            return Err(fail("capabilities must not be empty"));
        }
        if self.timeframes.is_empty() {
            return Err(fail("timeframes must not be empty"));
        }
        if self.personality.preferred_conditions.is_empty() {
            return Err(fail("preferred conditions must not be empty"));
        }
        if self.risk.max_positions < 1 {
            return Err(fail("max_positions must be at least 1"));
        }
        if !(self.risk.risk_per_trade > 0.0 && self.risk.risk_per_trade.is_finite()) {
            return Err(fail("risk_per_trade must be positive"));
        }
        if !(self.risk.win_rate_target > 0.0 && self.risk.win_rate_target < 1.0) {
            return Err(fail("win_rate_target must be inside (0, 1)"));
        }
        if self.performance.winning_trades > self.performance.total_trades {
            return Err(fail("winning_trades exceeds total_trades"));
        }
        Ok(())
    }
}
