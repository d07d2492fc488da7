//! Seeded categorical action sampler.

use rand::{SeedableRng, rngs::StdRng};

use crate::{ports::ActionSampler, utils::weighted_sample};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Samples actions in proportion to a probability row.
#[derive(Debug, Clone)]
pub struct CategoricalSampler {
    rng: StdRng,
}

impl CategoricalSampler {
    /// Sampler seeded from `seed`, or from OS entropy when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: build_rng(seed),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }
}

impl ActionSampler for CategoricalSampler {
    fn sample(&mut self, probabilities: &[f64]) -> usize {
        weighted_sample(&mut self.rng, probabilities).unwrap_or(0)
    }
}
