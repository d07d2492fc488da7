//! Feature encoders and discount schedules.

use crate::{
    ports::{DiscountSchedule, FeatureEncoder},
    types::Features,
    utils::one_hot,
};

/// One-hot encoding over a finite observation space.
#[derive(Debug, Clone, Copy)]
pub struct OneHotEncoder {
    dim: usize,
}

impl OneHotEncoder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl FeatureEncoder for OneHotEncoder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, observation: usize) -> Features {
        one_hot(observation, self.dim)
    }
}

/// The same γ everywhere.
#[derive(Debug, Clone, Copy)]
pub struct ConstantDiscount {
    gamma: f64,
}

impl ConstantDiscount {
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }
}

impl DiscountSchedule for ConstantDiscount {
    fn gamma(&self, _x: &Features) -> f64 {
        self.gamma
    }
}

/// γ everywhere except on terminal one-hot features, where it is 0.
///
/// A zero discount at termination stops bootstrapping from (and the
/// gradient correction into) the absorbing states' weights.
#[derive(Debug, Clone)]
pub struct TerminalDiscount {
    gamma: f64,
    terminals: Vec<usize>,
}

impl TerminalDiscount {
    pub fn new(gamma: f64, terminals: Vec<usize>) -> Self {
        Self { gamma, terminals }
    }
}

impl DiscountSchedule for TerminalDiscount {
    fn gamma(&self, x: &Features) -> f64 {
        let terminal = self
            .terminals
            .iter()
            .any(|&index| x.get(index).is_some_and(|v| *v > 0.0));
        if terminal { 0.0 } else { self.gamma }
    }
}
