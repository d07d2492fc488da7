//! Fixed-λ true-online GTD(λ) agent
//!
//! A single [`TraceLearner`] driven with a Lambda Function that is never
//! adapted. This is the baseline MTA is compared against.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    ports::{Learner, StepOutcome, Transition},
    td::{LambdaFunction, TraceLearner, TraceStep},
    types::{Features, StepSizes},
};

/// Step sizes for the fixed-λ agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TogtdConfig {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for TogtdConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            beta: 0.0001,
        }
    }
}

impl TogtdConfig {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    pub fn step_sizes(&self) -> StepSizes {
        StepSizes::new(self.alpha, self.beta)
    }
}

/// True-online GTD(λ) with a static λ(x).
#[derive(Debug, Clone)]
pub struct TogtdAgent {
    rates: StepSizes,
    learner: TraceLearner,
    lambda: LambdaFunction,
}

impl TogtdAgent {
    pub fn new(config: TogtdConfig, lambda: LambdaFunction) -> Result<Self> {
        let rates = config.step_sizes();
        rates.validate()?;
        Ok(Self {
            rates,
            learner: TraceLearner::new("togtd", lambda.dim()),
            lambda,
        })
    }

    pub fn learner(&self) -> &TraceLearner {
        &self.learner
    }
}

impl Learner for TogtdAgent {
    fn name(&self) -> &str {
        "togtd"
    }

    fn begin_episode(&mut self) {
        self.learner.reset();
    }

    fn step(&mut self, t: &Transition<'_>) -> Result<StepOutcome> {
        self.learner.learn(
            TraceStep {
                reward: t.reward,
                gamma_next: t.gamma_next,
                gamma_curr: t.gamma_curr,
                x_next: t.x_next,
                x_curr: t.x_curr,
                lambda_next: self.lambda.value(t.x_next)?,
                lambda_curr: self.lambda.value(t.x_curr)?,
                rho: t.rho,
            },
            self.rates,
        )?;
        self.learner.commit()?;
        Ok(StepOutcome::Committed)
    }

    fn value_weights(&self) -> &Features {
        self.learner.weights()
    }

    fn lambda(&self) -> &LambdaFunction {
        &self.lambda
    }
}
