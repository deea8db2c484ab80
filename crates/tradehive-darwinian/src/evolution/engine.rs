//! Evolution engine
//!
//! One cycle: evaluate fitness over a snapshot, plan retirements, breed
//! children from the top performers, regenerate toward the target size and
//! commit everything as a single atomic store mutation.

use crate::breeding::{seed_population, Breeder};
use crate::culling::{Candidate, RetirementPolicy};
use crate::fitness::FitnessCalculator;
use crate::population::PopulationStore;
use crate::telemetry::EvolutionMetrics;
use ordered_float::OrderedFloat;
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use tradehive_common::{
    Agent, AgentId, HiveError, PopulationError, Result, CROSSOVER_CHILDREN, DEFAULT_FLOOR_RATIO, DEFAULT_HARD_CAP_RATIO,
    DEFAULT_TARGET_POPULATION, GRACE_GENERATIONS, RETIREMENT_THRESHOLD, STABILITY_TRADES, TOP_K,
};

/// Evolution configuration
#[derive(Debug, Clone)]
pub struct EvolutionConfig {
    /// Population size regeneration fills toward
    pub target_size: usize,
    /// Floor as a fraction of `target_size`
    pub floor_ratio: f64,
    /// Hard cap as a multiple of `target_size`
    pub hard_cap_ratio: f64,
    /// Scores strictly below this are retirement-eligible
    pub retirement_threshold: f64,
    /// Cycles a new agent is protected from retirement
    pub grace_generations: u64,
    /// Breeding pool size
    pub top_k: usize,
    /// Crossover children per cycle
    pub crossover_children: usize,
    /// Trade count at which fitness stops being damped
    pub stability_trades: u64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_POPULATION,
            floor_ratio: DEFAULT_FLOOR_RATIO,
            hard_cap_ratio: DEFAULT_HARD_CAP_RATIO,
            retirement_threshold: RETIREMENT_THRESHOLD,
            grace_generations: GRACE_GENERATIONS,
            top_k: TOP_K,
            crossover_children: CROSSOVER_CHILDREN,
            stability_trades: STABILITY_TRADES,
        }
    }
}

impl EvolutionConfig {
    pub fn floor(&self) -> usize {
        ((self.target_size as f64 * self.floor_ratio).round() as usize).min(self.target_size)
    }

    pub fn hard_cap(&self) -> usize {
        ((self.target_size as f64 * self.hard_cap_ratio).round() as usize).max(self.target_size)
    }
}

/// Summary of one committed cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Generation counter after the commit
    pub generation: u64,
    pub retired: Vec<AgentId>,
    pub bred: usize,
    pub randomized: usize,
    pub population_size: usize,
    pub duration: Duration,
}

impl CycleReport {
    /// New agents added this cycle
    pub fn replaced(&self) -> usize {
        self.bred + self.randomized
    }
}

#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Another cycle was already running
    Skipped,
    Completed(CycleReport),
}

/// Clears the running flag on every exit path
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct EvolutionEngine {
    store: Arc<PopulationStore>,
    config: EvolutionConfig,
    calculator: FitnessCalculator,
    policy: RetirementPolicy,
    breeder: Mutex<Breeder>,
    running: AtomicBool,
    metrics: Option<EvolutionMetrics>,
}

impl EvolutionEngine {
    pub fn new(store: Arc<PopulationStore>, config: EvolutionConfig, breeder: Breeder) -> Self {
        Self {
            calculator: FitnessCalculator::new(config.stability_trades),
            policy: RetirementPolicy::new(config.retirement_threshold, config.grace_generations),
            store,
            config,
            breeder: Mutex::new(breeder),
            running: AtomicBool::new(false),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: EvolutionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<PopulationStore> {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Seed generation 0 from the archetypes when the store is empty
    ///
    /// Returns the number of agents created.
    pub fn seed_if_empty(&self) -> Result<usize> {
        if !self.store.is_empty() {
            return Ok(0);
        }
        let agents = seed_population(&mut self.breeder.lock(), self.config.target_size);
        let count = agents.len();
        self.store.replace(agents, 0)?;
        info!(agents = count, "Seeded population from archetypes");
        Ok(count)
    }

    /// Run one evolution cycle
    ///
    /// Skips without queueing when a cycle is already in flight. On error the
    /// store is untouched.
    #[instrument(skip(self))]
    pub fn run_cycle(&self) -> Result<CycleOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Evolution cycle already running, skipping trigger");
            if let Some(m) = &self.metrics {
                m.cycles_skipped.inc();
            }
            return Ok(CycleOutcome::Skipped);
        }
        let _guard = RunningGuard(&self.running);

        let started = Instant::now();
        match self.evolve(started) {
            Ok(report) => {
                info!(
                    generation = report.generation,
                    retired = report.retired.len(),
                    bred = report.bred,
                    randomized = report.randomized,
                    population = report.population_size,
                    "Evolution cycle completed"
                );
                if let Some(m) = &self.metrics {
                    m.cycles_completed.inc();
                    m.agents_retired.inc_by(report.retired.len() as u64);
                    m.agents_bred.inc_by(report.bred as u64);
                    m.agents_randomized.inc_by(report.randomized as u64);
                    m.population_size.set(report.population_size as i64);
                    m.generation.set(report.generation as i64);
                    m.cycle_duration_seconds.observe(report.duration.as_secs_f64());
                }
                Ok(CycleOutcome::Completed(report))
            }
            Err(e) => {
                error!(error = %e, "Evolution cycle failed, population unchanged");
                if let Some(m) = &self.metrics {
                    m.cycles_failed.inc();
                }
                Err(e)
            }
        }
    }

    fn evolve(&self, started: Instant) -> Result<CycleReport> {
        let snapshot = self.store.snapshot();
        let current = snapshot.len();
        let generation = snapshot.generation();
        let next_generation = generation + 1;

        let target = self.config.target_size;
        let floor = self.config.floor();

        // 1. evaluate
        let scores: HashMap<AgentId, f64> = self.calculator.evaluate(snapshot.iter()).into_iter().collect();

        // 2. retire
        let candidates = snapshot.iter().map(|agent| Candidate {
            id: agent.id,
            score: scores.get(&agent.id).copied().unwrap_or(0.0),
            generation: agent.generation,
        });
        let retired_ids = self.policy.plan(candidates, generation);
        let retired: HashSet<AgentId> = retired_ids.iter().copied().collect();
        let survivors = current - retired.len();

        // regeneration always fills back to the target
        let new_total = target.saturating_sub(survivors);

        let mut pool: Vec<&Agent> = snapshot.iter().filter(|a| !retired.contains(&a.id)).collect();
        pool.sort_by_key(|a| {
            (
                Reverse(OrderedFloat(scores.get(&a.id).copied().unwrap_or(0.0))),
                a.id,
            )
        });
        pool.truncate(self.config.top_k);

        let mut newcomers = Vec::with_capacity(new_total);
        let bred = {
            let mut breeder = self.breeder.lock();

            // 3. breed
            let wanted_children = self.config.crossover_children.min(new_total);
            for _ in 0..wanted_children {
                let Some((i, j)) = breeder.pick_pair(pool.len()) else {
                    break;
                };
                newcomers.push(breeder.crossover(pool[i], pool[j], next_generation));
            }
            let bred = newcomers.len();

            // 4. regenerate
            while newcomers.len() < new_total {
                newcomers.push(breeder.random_agent(next_generation));
            }
            bred
        };
        let randomized = newcomers.len() - bred;
        debug!(bred, randomized, "Prepared newcomers");

        // 5. commit
        let calculator = self.calculator;
        let population_size = self.store.mutate(|draft| {
            if draft.generation != generation {
                return Err(HiveError::Internal(format!(
                    "population replaced during cycle: generation {} -> {}",
                    generation, draft.generation
                )));
            }
            for agent in draft.agents.iter_mut() {
                agent.performance.overall_score = calculator.calculate(&agent.performance);
            }
            draft.agents.retain(|a| !retired.contains(&a.id));
            draft.agents.extend(newcomers);
            if draft.agents.len() < floor {
                warn!(size = draft.agents.len(), floor, "Cycle would leave the population below the floor");
                return Err(PopulationError::BelowFloor {
                    size: draft.agents.len(),
                    floor,
                }
                .into());
            }
            draft.generation = next_generation;
            Ok(draft.agents.len())
        })?;

        Ok(CycleReport {
            generation: next_generation,
            retired: retired_ids,
            bred,
            randomized,
            population_size,
            duration: started.elapsed(),
        })
    }
}
