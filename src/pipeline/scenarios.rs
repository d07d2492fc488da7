//! Ready-made scenarios
//!
//! The random-walk prediction task: estimate the value of a target policy
//! on an `n`-state chain while acting with a (possibly different) behavior
//! policy.

use serde::{Deserialize, Serialize};

use super::training::Scenario;
use crate::{
    Result,
    adapters::{DistributionEvaluator, OneHotEncoder, RandomWalk, TerminalDiscount},
    analysis::GroundTruth,
    policy::{PolicyMatrix, PolicyPair},
    ports::DiscountSchedule,
    types::Features,
    utils::one_hot,
};

/// Parameters of a random-walk prediction task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalkTask {
    /// Number of states, both ends included
    pub states: usize,
    /// Discount on non-terminal arrivals
    pub gamma: f64,
    /// Probability of moving right under the target policy
    pub target_right: f64,
    /// Probability of moving right under the behavior policy
    pub behavior_right: f64,
}

impl Default for RandomWalkTask {
    fn default() -> Self {
        Self {
            states: 5,
            gamma: 0.95,
            target_right: 0.5,
            behavior_right: 0.5,
        }
    }
}

impl RandomWalkTask {
    pub fn with_states(mut self, states: usize) -> Self {
        self.states = states;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_policies(mut self, target_right: f64, behavior_right: f64) -> Self {
        self.target_right = target_right;
        self.behavior_right = behavior_right;
        self
    }

    pub fn environment(&self) -> Result<RandomWalk> {
        RandomWalk::new(self.states)
    }

    pub fn policies(&self) -> Result<PolicyPair> {
        let target = PolicyMatrix::uniform_rows(
            "target",
            self.states,
            &[1.0 - self.target_right, self.target_right],
        )?;
        let behavior = PolicyMatrix::uniform_rows(
            "behavior",
            self.states,
            &[1.0 - self.behavior_right, self.behavior_right],
        )?;
        PolicyPair::new(target, behavior)
    }

    pub fn discount(&self) -> Result<TerminalDiscount> {
        let env = self.environment()?;
        Ok(TerminalDiscount::new(self.gamma, env.terminal_states()))
    }

    /// Exact target-policy values and visitation.
    pub fn ground_truth(&self) -> Result<GroundTruth> {
        let env = self.environment()?;
        let policies = self.policies()?;
        let chain = env.markov_chain(policies.target())?;
        let discount = self.discount()?;
        let gammas = Features::from_iterator(
            self.states,
            (0..self.states).map(|s| discount.gamma(&one_hot(s, self.states))),
        );
        GroundTruth::from_chain(&chain, &gammas)
    }

    /// A fresh scenario, evaluated under the target visitation distribution.
    pub fn scenario(&self) -> Result<Scenario> {
        let truth = self.ground_truth()?;
        let evaluator = DistributionEvaluator::new(Features::from_vec(truth.distribution))?;
        let scenario = Scenario::new(
            Box::new(self.environment()?),
            self.policies()?,
            Box::new(OneHotEncoder::new(self.states)),
            Box::new(self.discount()?),
        )?;
        Ok(scenario.with_evaluator(Box::new(evaluator)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_task_truth_matches_hand_solution() {
        let truth = RandomWalkTask::default().ground_truth().unwrap();
        let expected = [0.0, 0.20558, 0.43280, 0.70558, 0.0];
        for (got, want) in truth.values.iter().zip(expected) {
            assert!((got - want).abs() < 1e-4, "{got} vs {want}");
        }
    }

    #[test]
    fn behavior_must_cover_target() {
        let task = RandomWalkTask::default().with_policies(0.5, 1.0);
        assert!(task.policies().is_err());
    }
}
