//! Core value types shared across learners, controllers and pipelines

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Feature vector (and every learner vector) type.
pub type Features = DVector<f64>;

/// Step sizes for a single Trace Learner update.
///
/// `alpha` scales the primary weight update, `beta` the auxiliary
/// gradient-correction vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepSizes {
    pub alpha: f64,
    pub beta: f64,
}

impl StepSizes {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Both rates multiplied by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            alpha: self.alpha * factor,
            beta: self.beta * factor,
        }
    }

    /// Reject non-positive or non-finite rates.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::invalid_parameter(
                    name,
                    value,
                    "step size must be positive and finite",
                ));
            }
        }
        Ok(())
    }
}

/// Which moment of the return an evaluator should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationMode {
    Expectation,
    Variance,
}

/// Why an episode stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// The environment reported a terminal observation.
    Terminal,
    /// The accumulated importance weight exceeded the trust region.
    TrustRegion,
    /// The configured per-episode step limit was reached.
    StepLimit,
}

/// Check that `x` has dimension `expected`.
pub(crate) fn ensure_dim(x: &Features, expected: usize, context: &str) -> Result<()> {
    if x.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            got: x.len(),
            context: context.to_string(),
        });
    }
    Ok(())
}
