//! Population store - sole owner of the agent collection
//!
//! All writes go through one `parking_lot::RwLock`, so `mutate` and
//! `update_agent` are linearizable with respect to each other. Agents are
//! held behind `Arc` so a snapshot is a cheap pointer copy and an update only
//! clones the agent it touches while a snapshot still references it.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use tradehive_common::{Agent, AgentId, HiveError, PopulationError, Result};

/// Mutable working copy handed to [`PopulationStore::mutate`]
#[derive(Debug, Clone)]
pub struct PopulationDraft {
    pub agents: Vec<Agent>,
    pub generation: u64,
}

/// Read-only view of the population at one point in time
#[derive(Debug, Clone, Default)]
pub struct PopulationSnapshot {
    agents: Vec<Arc<Agent>>,
    generation: u64,
}

impl PopulationSnapshot {
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Generation counter when the snapshot was taken
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().map(|a| a.as_ref())
    }

    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.iter().find(|a| &a.id == id)
    }

    /// Owned copies of every agent
    pub fn to_vec(&self) -> Vec<Agent> {
        self.iter().cloned().collect()
    }
}

struct PopulationState {
    agents: Vec<Arc<Agent>>,
    index: HashMap<AgentId, usize>,
    generation: u64,
}

impl PopulationState {
    fn empty() -> Self {
        Self {
            agents: Vec::new(),
            index: HashMap::new(),
            generation: 0,
        }
    }
}

pub struct PopulationStore {
    state: RwLock<PopulationState>,
    /// Safety valve: a mutation never commits more agents than this
    hard_cap: usize,
}

impl PopulationStore {
    /// Create an empty store
    pub fn new(hard_cap: usize) -> Self {
        Self {
            state: RwLock::new(PopulationState::empty()),
            hard_cap,
        }
    }

    /// Create a store holding `agents` at generation 0
    pub fn with_agents(agents: Vec<Agent>, hard_cap: usize) -> Result<Self> {
        let store = Self::new(hard_cap);
        store.replace(agents, 0)?;
        Ok(store)
    }

    pub fn hard_cap(&self) -> usize {
        self.hard_cap
    }

    /// Copy-on-read snapshot; holds the read lock only for a pointer copy
    pub fn snapshot(&self) -> PopulationSnapshot {
        let state = self.state.read();
        PopulationSnapshot {
            agents: state.agents.clone(),
            generation: state.generation,
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.state.read().index.contains_key(id)
    }

    pub fn get(&self, id: &AgentId) -> Option<Agent> {
        let state = self.state.read();
        state
            .index
            .get(id)
            .map(|&idx| state.agents[idx].as_ref().clone())
    }

    /// Apply an atomic batch mutation
    ///
    /// The closure works on a copy. The copy is committed only if the closure
    /// succeeds and the result respects the hard cap, has unique ids, valid
    /// agents and a non-decreasing generation. Otherwise the store is left
    /// exactly as it was.
    pub fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PopulationDraft) -> Result<T>,
    {
        let mut state = self.state.write();

        let mut draft = PopulationDraft {
            agents: state.agents.iter().map(|a| a.as_ref().clone()).collect(),
            generation: state.generation,
        };

        let output = f(&mut draft)?;

        if draft.generation < state.generation {
            return Err(HiveError::Internal(format!(
                "generation counter moved backwards: {} -> {}",
                state.generation, draft.generation
            )));
        }
        self.commit(&mut state, draft)?;
        Ok(output)
    }

    /// Validate a draft and swap it in
    fn commit(&self, state: &mut PopulationState, mut draft: PopulationDraft) -> Result<()> {
        if draft.agents.len() > self.hard_cap {
            warn!(
                size = draft.agents.len(),
                hard_cap = self.hard_cap,
                "Rejected population mutation above hard cap"
            );
            return Err(PopulationError::CapacityExceeded {
                size: draft.agents.len(),
                limit: self.hard_cap,
            }
            .into());
        }

        let mut index = HashMap::with_capacity(draft.agents.len());
        for (i, agent) in draft.agents.iter_mut().enumerate() {
            agent.personality.clamp();
            agent.validate()?;
            if index.insert(agent.id, i).is_some() {
                warn!(agent_id = %agent.id, "Rejected population mutation with duplicate id");
                return Err(PopulationError::DuplicateAgent(agent.id).into());
            }
        }

        debug!(
            before = state.agents.len(),
            after = draft.agents.len(),
            generation = draft.generation,
            "Committed population mutation"
        );

        state.agents = draft.agents.into_iter().map(Arc::new).collect();
        state.index = index;
        state.generation = draft.generation;
        Ok(())
    }

    /// Atomic single-agent update
    ///
    /// Returns false when the id is unknown; the agent may have been retired
    /// concurrently, which is expected and not an error. Identity is restored
    /// and traits are re-clamped after the closure runs. An update that still
    /// leaves the agent invalid is rolled back and also returns false.
    pub fn update_agent<F>(&self, id: &AgentId, f: F) -> bool
    where
        F: FnOnce(&mut Agent),
    {
        let mut state = self.state.write();
        let Some(&idx) = state.index.get(id) else {
            return false;
        };

        let slot = &mut state.agents[idx];
        let previous = Arc::clone(slot);
        let agent = Arc::make_mut(slot);
        f(agent);
        agent.id = *id;
        normalize(agent);
        if let Err(e) = agent.validate() {
            warn!(agent_id = %id, error = %e, "Rejected agent update, agent unchanged");
            *slot = previous;
            return false;
        }
        true
    }

    /// Apply `f` to every agent under one write lock
    ///
    /// Returns how many agents took the update; invalid results are rolled
    /// back per agent, as in `update_agent`.
    pub fn update_all<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&mut Agent),
    {
        let mut state = self.state.write();
        let mut updated = 0;
        for slot in state.agents.iter_mut() {
            let previous = Arc::clone(slot);
            let agent = Arc::make_mut(slot);
            let id = agent.id;
            f(agent);
            agent.id = id;
            normalize(agent);
            match agent.validate() {
                Ok(()) => updated += 1,
                Err(e) => {
                    warn!(agent_id = %id, error = %e, "Rejected agent update, agent unchanged");
                    *slot = previous;
                }
            }
        }
        updated
    }

    /// Replace the whole population (seeding and snapshot restore)
    ///
    /// Unlike `mutate`, the generation counter may move backwards here.
    pub fn replace(&self, agents: Vec<Agent>, generation: u64) -> Result<()> {
        let mut state = self.state.write();
        self.commit(&mut state, PopulationDraft { agents, generation })
    }
}

/// Repairs an update can make without being rejected for it
fn normalize(agent: &mut Agent) {
    agent.personality.clamp();
    if agent.performance.winning_trades > agent.performance.total_trades {
        agent.performance.winning_trades = agent.performance.total_trades;
    }
}
