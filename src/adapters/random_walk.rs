//! Random-walk chain environment.
//!
//! States `0..n` form a line. Both ends are absorbing, every episode starts in
//! the middle, action 0 moves left and action 1 moves right. Entering the
//! right end pays +1, every other transition pays 0.

use nalgebra::{DMatrix, DVector};

use crate::{
    Error, Result,
    analysis::MarkovChain,
    policy::PolicyMatrix,
    ports::{EnvStep, Environment},
};

pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;

#[derive(Debug, Clone)]
pub struct RandomWalk {
    num_states: usize,
    start: usize,
    position: usize,
}

impl RandomWalk {
    /// Create a walk over `num_states` states (at least 3).
    pub fn new(num_states: usize) -> Result<Self> {
        if num_states < 3 {
            return Err(Error::InvalidConfiguration {
                message: format!("random walk needs at least 3 states, got {num_states}"),
            });
        }
        let start = num_states / 2;
        Ok(Self {
            num_states,
            start,
            position: start,
        })
    }

    pub fn start_state(&self) -> usize {
        self.start
    }

    pub fn is_terminal(&self, state: usize) -> bool {
        state == 0 || state == self.num_states - 1
    }

    pub fn terminal_states(&self) -> Vec<usize> {
        vec![0, self.num_states - 1]
    }

    fn successor(&self, state: usize, action: usize) -> usize {
        match action {
            LEFT => state - 1,
            _ => state + 1,
        }
    }

    /// Exact state-to-state dynamics when actions follow `policy`.
    ///
    /// Terminal rows are left empty (absorbing with no further reward).
    pub fn markov_chain(&self, policy: &PolicyMatrix) -> Result<MarkovChain> {
        if policy.num_states() != self.num_states || policy.num_actions() != 2 {
            return Err(Error::InvalidPolicy {
                policy: policy.name().to_string(),
                reason: format!(
                    "random walk needs a {}x2 policy, got {}x{}",
                    self.num_states,
                    policy.num_states(),
                    policy.num_actions()
                ),
            });
        }

        let n = self.num_states;
        let mut transitions = DMatrix::zeros(n, n);
        let mut rewards = DVector::zeros(n);
        for state in (0..n).filter(|s| !self.is_terminal(*s)) {
            for action in [LEFT, RIGHT] {
                let p = policy.probability(state, action);
                let next = self.successor(state, action);
                transitions[(state, next)] += p;
                if next == n - 1 {
                    rewards[state] += p;
                }
            }
        }

        let mut start = DVector::zeros(n);
        start[self.start] = 1.0;

        MarkovChain::new(transitions, rewards, start, self.terminal_states())
    }
}

impl Environment for RandomWalk {
    fn num_states(&self) -> usize {
        self.num_states
    }

    fn num_actions(&self) -> usize {
        2
    }

    fn reset(&mut self) -> usize {
        self.position = self.start;
        self.position
    }

    fn step(&mut self, action: usize) -> Result<EnvStep> {
        if action > RIGHT {
            return Err(Error::InvalidAction {
                action,
                num_actions: 2,
            });
        }
        if self.is_terminal(self.position) {
            return Ok(EnvStep {
                observation: self.position,
                reward: 0.0,
                done: true,
            });
        }

        self.position = self.successor(self.position, action);
        Ok(EnvStep {
            observation: self.position,
            reward: if self.position == self.num_states - 1 {
                1.0
            } else {
                0.0
            },
            done: self.is_terminal(self.position),
        })
    }
}
