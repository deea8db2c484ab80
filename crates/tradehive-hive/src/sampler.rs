//! Contribution sampler: periodic agent chatter feeding the consensus log

use crate::confidence::ConfidenceSource;
use crate::scheduler::Job;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, warn};
use tradehive_common::{Agent, Contribution, Result};
use tradehive_consensus::ConsensusAggregator;
use tradehive_darwinian::PopulationStore;

pub struct ContributionSampler {
    store: Arc<PopulationStore>,
    aggregator: Arc<ConsensusAggregator>,
    source: Arc<dyn ConfidenceSource>,
    sample_size: usize,
    rng: Mutex<StdRng>,
}

impl ContributionSampler {
    pub fn new(
        store: Arc<PopulationStore>,
        aggregator: Arc<ConsensusAggregator>,
        source: Arc<dyn ConfidenceSource>,
        sample_size: usize,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            aggregator,
            source,
            sample_size,
            rng: Mutex::new(rng),
        }
    }

    pub fn with_seed(
        store: Arc<PopulationStore>,
        aggregator: Arc<ConsensusAggregator>,
        source: Arc<dyn ConfidenceSource>,
        sample_size: usize,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(store, aggregator, source, sample_size, rng)
    }

    /// Ask up to `sample_size` random active agents for a view and record it
    ///
    /// Returns the number of contributions recorded.
    pub async fn sample_once(&self) -> Result<usize> {
        let snapshot = self.store.snapshot();
        let picked: Vec<Agent> = {
            let active: Vec<&Agent> = snapshot.iter().filter(|a| a.active).collect();
            let mut rng = self.rng.lock();
            active
                .choose_multiple(&mut *rng, self.sample_size)
                .map(|a| (*a).clone())
                .collect()
        };

        let mut recorded = 0;
        for agent in &picked {
            let assessment = match self.source.assess(agent).await {
                Ok(a) => a,
                Err(e) => {
                    warn!(agent_id = %agent.id, error = %e, "Confidence source failed");
                    continue;
                }
            };
            let contribution = Contribution::new(
                agent.id,
                assessment.direction,
                assessment.confidence,
                assessment.message,
            );
            match self.aggregator.record_contribution(contribution) {
                Ok(()) => recorded += 1,
                Err(e) => warn!(agent_id = %agent.id, error = %e, "Dropped contribution"),
            }
        }

        debug!(sampled = picked.len(), recorded, "Sampled agent contributions");
        Ok(recorded)
    }
}

#[async_trait]
impl Job for ContributionSampler {
    fn name(&self) -> &'static str {
        "contribution-sampler"
    }

    async fn tick(&self) -> Result<()> {
        self.sample_once().await.map(|_| ())
    }
}
