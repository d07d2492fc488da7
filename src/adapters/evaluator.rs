//! Distribution-weighted evaluator.

use crate::{
    Error, Result,
    ports::Evaluator,
    types::{EvaluationMode, Features},
};

/// Projects a weight vector onto a reference distribution over features.
///
/// In expectation mode the reading is `d·w`; in variance mode it is the
/// `d`-weighted spread of the weights around that mean.
#[derive(Debug, Clone)]
pub struct DistributionEvaluator {
    distribution: Features,
}

impl DistributionEvaluator {
    /// `distribution` must be non-negative with a positive total; it is
    /// normalised here.
    pub fn new(distribution: Features) -> Result<Self> {
        let total: f64 = distribution.sum();
        if distribution.iter().any(|p| *p < 0.0 || !p.is_finite()) || total <= 0.0 {
            return Err(Error::InvalidConfiguration {
                message: "reference distribution must be non-negative with positive mass"
                    .to_string(),
            });
        }
        Ok(Self {
            distribution: distribution / total,
        })
    }

    pub fn distribution(&self) -> &Features {
        &self.distribution
    }
}

impl Evaluator for DistributionEvaluator {
    fn evaluate(&self, weights: &Features, mode: EvaluationMode) -> f64 {
        let mean = self.distribution.dot(weights);
        match mode {
            EvaluationMode::Expectation => mean,
            EvaluationMode::Variance => self
                .distribution
                .iter()
                .zip(weights.iter())
                .map(|(p, w)| p * (w - mean).powi(2))
                .sum(),
        }
    }
}
