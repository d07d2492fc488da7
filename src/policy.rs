//! Target and behavior policy matrices and importance-sampling ratios

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Row-stochastic `states × actions` probability table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyMatrix {
    name: String,
    rows: Vec<Vec<f64>>,
}

impl PolicyMatrix {
    /// Build and validate a policy matrix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPolicy`] for an empty or ragged table, entries
    /// outside [0, 1], or rows that do not sum to 1.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: String| Error::InvalidPolicy {
            policy: name.clone(),
            reason,
        };

        let num_actions = rows.first().map(Vec::len).unwrap_or(0);
        if rows.is_empty() || num_actions == 0 {
            return Err(invalid("policy must have at least one state and action".into()));
        }

        for (state, row) in rows.iter().enumerate() {
            if row.len() != num_actions {
                return Err(invalid(format!(
                    "state {state} has {} actions, expected {num_actions}",
                    row.len()
                )));
            }
            if let Some(p) = row.iter().find(|p| !(0.0..=1.0).contains(*p)) {
                return Err(invalid(format!("state {state} has probability {p}")));
            }
            let total: f64 = row.iter().sum();
            if (total - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(invalid(format!("state {state} sums to {total}")));
            }
        }

        Ok(Self { name, rows })
    }

    /// Same action distribution in every state.
    pub fn uniform_rows(
        name: impl Into<String>,
        num_states: usize,
        probabilities: &[f64],
    ) -> Result<Self> {
        Self::new(name, vec![probabilities.to_vec(); num_states])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_states(&self) -> usize {
        self.rows.len()
    }

    pub fn num_actions(&self) -> usize {
        self.rows[0].len()
    }

    pub fn row(&self, state: usize) -> &[f64] {
        &self.rows[state]
    }

    pub fn probability(&self, state: usize, action: usize) -> f64 {
        self.rows[state][action]
    }
}

/// Target/behavior policies with absolute continuity checked up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyPair {
    target: PolicyMatrix,
    behavior: PolicyMatrix,
}

impl PolicyPair {
    /// Pair two policies.
    ///
    /// # Errors
    ///
    /// Fails if shapes differ or if the behavior policy gives zero probability
    /// to an action the target policy can take.
    pub fn new(target: PolicyMatrix, behavior: PolicyMatrix) -> Result<Self> {
        if target.num_states() != behavior.num_states()
            || target.num_actions() != behavior.num_actions()
        {
            return Err(Error::InvalidPolicy {
                policy: behavior.name.clone(),
                reason: format!(
                    "shape {}x{} does not match target shape {}x{}",
                    behavior.num_states(),
                    behavior.num_actions(),
                    target.num_states(),
                    target.num_actions()
                ),
            });
        }

        for state in 0..target.num_states() {
            for action in 0..target.num_actions() {
                let target_probability = target.probability(state, action);
                if target_probability > 0.0 && behavior.probability(state, action) <= 0.0 {
                    return Err(Error::PolicySupport {
                        state,
                        action,
                        target_probability,
                    });
                }
            }
        }

        Ok(Self { target, behavior })
    }

    /// Identical target and behavior.
    pub fn on_policy(policy: PolicyMatrix) -> Self {
        Self {
            target: policy.clone(),
            behavior: policy,
        }
    }

    pub fn target(&self) -> &PolicyMatrix {
        &self.target
    }

    pub fn behavior(&self) -> &PolicyMatrix {
        &self.behavior
    }

    pub fn is_on_policy(&self) -> bool {
        self.target == self.behavior
    }

    /// ρ = π(a|s) / b(a|s).
    pub fn importance_ratio(&self, state: usize, action: usize) -> Result<f64> {
        let behavior = self.behavior.probability(state, action);
        if behavior <= 0.0 {
            return Err(Error::ZeroBehaviorProbability { state, action });
        }
        Ok(self.target.probability(state, action) / behavior)
    }

    /// ln π(a|s) − ln b(a|s); −∞ when the target never takes `action`.
    pub fn log_importance_ratio(&self, state: usize, action: usize) -> Result<f64> {
        let behavior = self.behavior.probability(state, action);
        if behavior <= 0.0 {
            return Err(Error::ZeroBehaviorProbability { state, action });
        }
        Ok(self.target.probability(state, action).ln() - behavior.ln())
    }
}
