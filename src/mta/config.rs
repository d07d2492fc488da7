//! Hyperparameters for the meta-trace-adaptation controller

use serde::{Deserialize, Serialize};

use crate::{Error, Result, types::StepSizes};

/// Configuration for an [`MtaController`](super::MtaController).
///
/// # Examples
///
/// ```
/// use meta_trace::mta::MtaConfig;
///
/// let config = MtaConfig::default()
///     .with_step_sizes(0.01, 0.01)
///     .with_kappa(0.1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MtaConfig {
    /// Step size for the value, MC-expectation and variance learners
    pub alpha: f64,
    /// Step size for their gradient-correction vectors
    pub beta: f64,
    /// Meta step size applied to the λ gradient
    pub kappa: f64,
    /// Step-size multiplier for the λ-return expectation learner
    pub lambda_step_scale: f64,
    /// Largest accumulated importance weight still trusted in an episode
    pub trust_region: f64,
}

impl Default for MtaConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            beta: 0.05,
            kappa: 0.01,
            lambda_step_scale: 1.1,
            trust_region: 1e6,
        }
    }
}

impl MtaConfig {
    pub fn with_step_sizes(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn with_kappa(mut self, kappa: f64) -> Self {
        self.kappa = kappa;
        self
    }

    pub fn with_lambda_step_scale(mut self, scale: f64) -> Self {
        self.lambda_step_scale = scale;
        self
    }

    pub fn with_trust_region(mut self, trust_region: f64) -> Self {
        self.trust_region = trust_region;
        self
    }

    pub fn step_sizes(&self) -> StepSizes {
        StepSizes::new(self.alpha, self.beta)
    }

    /// Reject configurations the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.step_sizes().validate()?;
        self.step_sizes().scaled(self.lambda_step_scale).validate()?;
        if !(self.kappa.is_finite() && self.kappa >= 0.0) {
            return Err(Error::invalid_parameter(
                "kappa",
                self.kappa,
                "meta step size must be non-negative and finite",
            ));
        }
        if self.trust_region.is_nan() || self.trust_region <= 0.0 {
            return Err(Error::invalid_parameter(
                "trust_region",
                self.trust_region,
                "must be positive",
            ));
        }
        Ok(())
    }
}
