//! Retirement policy: fitness < threshold after the grace period = retire

use ordered_float::OrderedFloat;
use tradehive_common::AgentId;

/// Retirement candidate as seen by the policy
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub id: AgentId,
    pub score: f64,
    /// Generation the agent was produced in
    pub generation: u64,
}

pub struct RetirementPolicy {
    threshold: f64,
    grace_generations: u64,
}

impl RetirementPolicy {
    pub fn new(threshold: f64, grace_generations: u64) -> Self {
        Self {
            threshold,
            grace_generations,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Agents younger than the grace period are protected
    pub fn in_grace(&self, agent_generation: u64, current_generation: u64) -> bool {
        agent_generation.saturating_add(self.grace_generations) > current_generation
    }

    pub fn should_retire(&self, score: f64, agent_generation: u64, current_generation: u64) -> bool {
        score < self.threshold && !self.in_grace(agent_generation, current_generation)
    }

    /// Every eligible agent, worst score first
    pub fn plan<I>(&self, candidates: I, current_generation: u64) -> Vec<AgentId>
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut eligible: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| self.should_retire(c.score, c.generation, current_generation))
            .collect();

        eligible.sort_by(|a, b| {
            OrderedFloat(a.score)
                .cmp(&OrderedFloat(b.score))
                .then_with(|| a.id.cmp(&b.id))
        });
        eligible.into_iter().map(|c| c.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(score: f64, generation: u64) -> Candidate {
        Candidate {
            id: AgentId::new(),
            score,
            generation,
        }
    }

    #[test]
    fn test_grace_period() {
        let policy = RetirementPolicy::new(0.3, 1);
        // produced by the cycle that just committed generation 5
        assert!(policy.in_grace(5, 5));
        assert!(!policy.in_grace(4, 5));
        assert!(!policy.should_retire(0.0, 5, 5));
        assert!(policy.should_retire(0.0, 4, 5));
    }

    #[test]
    fn test_threshold_is_strict() {
        let policy = RetirementPolicy::new(0.3, 1);
        assert!(!policy.should_retire(0.3, 0, 3));
        assert!(policy.should_retire(0.299, 0, 3));
    }

    #[test]
    fn test_plan_never_retires_fit_agents() {
        let policy = RetirementPolicy::new(0.3, 1);
        let candidates = vec![candidate(0.9, 0), candidate(0.31, 0), candidate(0.1, 0)];
        let low = candidates[2].id;

        assert_eq!(policy.plan(candidates, 2), vec![low]);
    }

    #[test]
    fn test_plan_orders_worst_first() {
        let policy = RetirementPolicy::new(0.3, 1);
        let candidates = vec![
            candidate(0.25, 0),
            candidate(0.05, 0),
            candidate(0.15, 0),
            candidate(0.0, 0),
            // still in grace
            candidate(0.0, 1),
        ];
        let expected = vec![candidates[3].id, candidates[1].id, candidates[2].id, candidates[0].id];

        assert_eq!(policy.plan(candidates, 1), expected);
    }
}
