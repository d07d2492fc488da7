//! Small injected strategies: feature encoding, discounting, evaluation,
//! and action sampling.
//!
//! Each trait has one pure method (the sampler excepted, which owns its
//! random state) so a run can be assembled from independent pieces.

use crate::types::{EvaluationMode, Features};

/// Maps an observation to a fixed-dimension feature vector.
pub trait FeatureEncoder: Send + Sync {
    fn dim(&self) -> usize;

    fn encode(&self, observation: usize) -> Features;
}

/// State-dependent discount γ(x) ∈ [0, 1].
pub trait DiscountSchedule: Send + Sync {
    fn gamma(&self, x: &Features) -> f64;
}

/// Diagnostic projection of a weight vector to a scalar.
///
/// Used only for recording; never feeds back into learning.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, weights: &Features, mode: EvaluationMode) -> f64;
}

/// Draws an action index from a probability row.
pub trait ActionSampler: Send {
    fn sample(&mut self, probabilities: &[f64]) -> usize;
}
