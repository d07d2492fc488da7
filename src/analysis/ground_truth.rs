//! Exact values for small finite Markov chains
//!
//! Used to score learned weights against the true state values of the target
//! policy, weighted by how often that policy visits each state.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const ROW_TOLERANCE: f64 = 1e-9;

/// State-to-state dynamics induced by a fixed policy.
///
/// Rows of absorbing states are all zero.
#[derive(Debug, Clone)]
pub struct MarkovChain {
    transitions: DMatrix<f64>,
    expected_rewards: DVector<f64>,
    start: DVector<f64>,
    terminal: Vec<usize>,
}

impl MarkovChain {
    pub fn new(
        transitions: DMatrix<f64>,
        expected_rewards: DVector<f64>,
        start: DVector<f64>,
        terminal: Vec<usize>,
    ) -> Result<Self> {
        let n = transitions.nrows();
        if transitions.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                got: transitions.ncols(),
                context: "transition matrix columns".to_string(),
            });
        }
        for (len, context) in [
            (expected_rewards.len(), "expected rewards"),
            (start.len(), "start distribution"),
        ] {
            if len != n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    got: len,
                    context: context.to_string(),
                });
            }
        }
        for (row_index, row) in transitions.row_iter().enumerate() {
            let total = row.sum();
            if row.iter().any(|p| *p < 0.0) || total > 1.0 + ROW_TOLERANCE {
                return Err(Error::InvalidConfiguration {
                    message: format!("transition row {row_index} is not sub-stochastic"),
                });
            }
        }

        Ok(Self {
            transitions,
            expected_rewards,
            start,
            terminal,
        })
    }

    pub fn num_states(&self) -> usize {
        self.transitions.nrows()
    }

    pub fn transitions(&self) -> &DMatrix<f64> {
        &self.transitions
    }

    pub fn expected_rewards(&self) -> &DVector<f64> {
        &self.expected_rewards
    }

    pub fn terminal_states(&self) -> &[usize] {
        &self.terminal
    }

    /// Solve `v = r + P·diag(γ)·v` where `gammas[s']` discounts arrival in `s'`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SingularSystem`] if the discounted chain never
    /// terminates.
    pub fn state_values(&self, gammas: &DVector<f64>) -> Result<DVector<f64>> {
        if gammas.len() != self.num_states() {
            return Err(Error::DimensionMismatch {
                expected: self.num_states(),
                got: gammas.len(),
                context: "per-state discounts".to_string(),
            });
        }
        let n = self.num_states();
        let system = DMatrix::identity(n, n) - &self.transitions * DMatrix::from_diagonal(gammas);
        system
            .lu()
            .solve(&self.expected_rewards)
            .ok_or_else(|| Error::SingularSystem {
                context: "state values".to_string(),
            })
    }

    /// Normalised expected visit counts per episode, terminal arrivals included.
    pub fn visitation(&self) -> Result<DVector<f64>> {
        let n = self.num_states();
        let system = (DMatrix::identity(n, n) - &self.transitions).transpose();
        let visits = system
            .lu()
            .solve(&self.start)
            .ok_or_else(|| Error::SingularSystem {
                context: "visitation".to_string(),
            })?;
        let total = visits.sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(Error::SingularSystem {
                context: "visitation mass".to_string(),
            });
        }
        Ok(visits / total)
    }
}

/// True values of the target policy and its on-policy state distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub values: Vec<f64>,
    pub distribution: Vec<f64>,
}

impl GroundTruth {
    pub fn from_chain(chain: &MarkovChain, gammas: &DVector<f64>) -> Result<Self> {
        let values = chain.state_values(gammas)?;
        let distribution = chain.visitation()?;
        Ok(Self {
            values: values.iter().copied().collect(),
            distribution: distribution.iter().copied().collect(),
        })
    }

    /// Distribution-weighted squared error of `weights` against the true values.
    pub fn weighted_mse(&self, weights: &[f64]) -> Result<f64> {
        super::stats::weighted_mse(weights, &self.values, &self.distribution)
    }
}
