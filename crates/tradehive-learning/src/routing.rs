//! Event routing rules

use tradehive_common::{AgentId, Capability, LearningEvent, LearningEventType};
use tradehive_darwinian::PopulationSnapshot;

/// Capabilities interested in chart patterns and screenshots
pub const PATTERN_CAPABILITIES: &[Capability] = &[
    Capability::PriceAction,
    Capability::ChartPatterns,
    Capability::PatternRecognition,
];

/// Capabilities interested in transcripts
pub const TRANSCRIPT_CAPABILITIES: &[Capability] = &[
    Capability::Sentiment,
    Capability::NewsAnalysis,
    Capability::MarketPsychology,
];

/// Who receives an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Agents holding any of the capabilities
    Capabilities(&'static [Capability]),
    /// Every agent
    Broadcast,
    /// Exactly these agents, when present
    Agents(Vec<AgentId>),
}

impl Route {
    /// Routing rule for an event
    pub fn for_event(event: &LearningEvent) -> Self {
        match event.event_type {
            LearningEventType::Pattern | LearningEventType::Screenshot => {
                Route::Capabilities(PATTERN_CAPABILITIES)
            }
            LearningEventType::Transcript => Route::Capabilities(TRANSCRIPT_CAPABILITIES),
            LearningEventType::Session => Route::Broadcast,
            LearningEventType::Performance => {
                let targets = event.target_agents();
                if targets.is_empty() {
                    Route::Broadcast
                } else {
                    Route::Agents(targets)
                }
            }
        }
    }

    /// Resolve against a snapshot
    ///
    /// Explicit targets are passed through unfiltered; ids retired since
    /// are skipped at delivery time.
    pub fn resolve(&self, snapshot: &PopulationSnapshot) -> Vec<AgentId> {
        match self {
            Route::Capabilities(wanted) => snapshot
                .iter()
                .filter(|a| a.has_any_capability(wanted))
                .map(|a| a.id)
                .collect(),
            Route::Broadcast => snapshot.iter().map(|a| a.id).collect(),
            Route::Agents(ids) => ids.clone(),
        }
    }
}
