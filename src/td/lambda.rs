//! State-dependent trace decay λ(x)
//!
//! λ is produced by a logistic squash of a parametric score, so the output
//! stays in (0, 1) and the gradient `λ(1 − λ)` fades out at both ends.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    types::{Features, ensure_dim},
    utils::{logistic, logit},
};

/// Distance kept from the open interval's end points.
pub const LAMBDA_MARGIN: f64 = 1e-6;

/// Parametric form used to score a feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LambdaApproximator {
    /// λ(x) = σ(θ·x)
    #[default]
    Linear,
    /// λ(x) = σ(θ_k) where `k` is the largest component of `x`
    Tabular,
}

/// Serializable description of an initial Lambda Function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LambdaConfig {
    /// Every parameter starts at `init` (the score, before squashing).
    Adaptive {
        approximator: LambdaApproximator,
        init: f64,
    },
    /// Tabular λ pinned at `value` for every feature.
    Constant { value: f64 },
}

impl Default for LambdaConfig {
    fn default() -> Self {
        LambdaConfig::Adaptive {
            approximator: LambdaApproximator::Linear,
            init: 1.0,
        }
    }
}

/// Differentiable map from features to a trace-decay value.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaFunction {
    approximator: LambdaApproximator,
    theta: Features,
}

impl LambdaFunction {
    pub fn linear(theta: Features) -> Self {
        Self {
            approximator: LambdaApproximator::Linear,
            theta,
        }
    }

    pub fn tabular(theta: Features) -> Self {
        Self {
            approximator: LambdaApproximator::Tabular,
            theta,
        }
    }

    /// Tabular λ equal to `value` on every one-hot feature.
    pub fn constant(dim: usize, value: f64) -> Self {
        let value = value.clamp(LAMBDA_MARGIN, 1.0 - LAMBDA_MARGIN);
        Self::tabular(Features::from_element(dim, logit(value)))
    }

    pub fn from_config(config: &LambdaConfig, dim: usize) -> Self {
        match *config {
            LambdaConfig::Adaptive { approximator, init } => Self {
                approximator,
                theta: Features::from_element(dim, init),
            },
            LambdaConfig::Constant { value } => Self::constant(dim, value),
        }
    }

    pub fn approximator(&self) -> LambdaApproximator {
        self.approximator
    }

    pub fn parameters(&self) -> &Features {
        &self.theta
    }

    pub fn dim(&self) -> usize {
        self.theta.len()
    }

    /// λ(x), always strictly inside (0, 1).
    pub fn value(&self, x: &Features) -> Result<f64> {
        ensure_dim(x, self.theta.len(), "lambda function")?;
        Ok(self.squash(self.score(x)))
    }

    /// One descent step: θ ← θ − signal · ∂λ(x)/∂θ.
    ///
    /// `signal` already includes the step size.
    pub fn gradient_descent(&mut self, x: &Features, signal: f64) -> Result<()> {
        let lambda = self.value(x)?;
        let slope = lambda * (1.0 - lambda);
        match self.approximator {
            LambdaApproximator::Linear => {
                self.theta.axpy(-signal * slope, x, 1.0);
            }
            LambdaApproximator::Tabular => {
                let cell = active_cell(x);
                self.theta[cell] -= signal * slope;
            }
        }
        Ok(())
    }

    fn score(&self, x: &Features) -> f64 {
        match self.approximator {
            LambdaApproximator::Linear => self.theta.dot(x),
            LambdaApproximator::Tabular => self.theta[active_cell(x)],
        }
    }

    fn squash(&self, score: f64) -> f64 {
        logistic(score).clamp(LAMBDA_MARGIN, 1.0 - LAMBDA_MARGIN)
    }
}

/// Index of the largest component (first on ties).
fn active_cell(x: &Features) -> usize {
    x.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_value), (i, &v)| {
            if v > best_value { (i, v) } else { (best, best_value) }
        })
        .0
}
