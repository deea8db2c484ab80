//! Prometheus metrics for the evolution engine

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use tradehive_common::Result;

/// Evolution metrics
#[derive(Clone)]
pub struct EvolutionMetrics {
    pub cycles_completed: IntCounter,
    pub cycles_failed: IntCounter,
    pub cycles_skipped: IntCounter,
    pub agents_retired: IntCounter,
    pub agents_bred: IntCounter,
    pub agents_randomized: IntCounter,
    pub population_size: IntGauge,
    pub generation: IntGauge,
    pub cycle_duration_seconds: Histogram,
}

impl EvolutionMetrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            cycles_completed: IntCounter::new(
                "tradehive_evolution_cycles_completed_total",
                "Evolution cycles committed",
            )?,
            cycles_failed: IntCounter::new(
                "tradehive_evolution_cycles_failed_total",
                "Evolution cycles abandoned without commit",
            )?,
            cycles_skipped: IntCounter::new(
                "tradehive_evolution_cycles_skipped_total",
                "Evolution triggers skipped because a cycle was running",
            )?,
            agents_retired: IntCounter::new(
                "tradehive_evolution_agents_retired_total",
                "Agents removed by retirement",
            )?,
            agents_bred: IntCounter::new(
                "tradehive_evolution_agents_bred_total",
                "Agents produced by crossover",
            )?,
            agents_randomized: IntCounter::new(
                "tradehive_evolution_agents_randomized_total",
                "Agents produced by randomization",
            )?,
            population_size: IntGauge::new(
                "tradehive_population_size",
                "Agents in the population after the last commit",
            )?,
            generation: IntGauge::new(
                "tradehive_population_generation",
                "Current generation counter",
            )?,
            cycle_duration_seconds: Histogram::with_opts(
                HistogramOpts::new(
                    "tradehive_evolution_cycle_duration_seconds",
                    "Wall time of one evolution cycle",
                )
                .buckets(prometheus::exponential_buckets(0.001, 4.0, 8)?),
            )?,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.cycles_completed.clone()))?;
        registry.register(Box::new(self.cycles_failed.clone()))?;
        registry.register(Box::new(self.cycles_skipped.clone()))?;
        registry.register(Box::new(self.agents_retired.clone()))?;
        registry.register(Box::new(self.agents_bred.clone()))?;
        registry.register(Box::new(self.agents_randomized.clone()))?;
        registry.register(Box::new(self.population_size.clone()))?;
        registry.register(Box::new(self.generation.clone()))?;
        registry.register(Box::new(self.cycle_duration_seconds.clone()))?;
        Ok(())
    }
}
