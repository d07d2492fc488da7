//! Meta-trace-adaptation controller
//!
//! Four Trace Learners run side by side on every transition:
//!
//! | Learner | Target | λ | Step sizes |
//! |---------|--------|---|------------|
//! | value | value function | λ(x) | α, β |
//! | MC expectation | Monte Carlo return | 1 | α, β |
//! | λ expectation | λ-return | λ(x) | scale·α, scale·β |
//! | λ variance | second moment of the λ-return | 1 | α, β |
//!
//! The variance learner reuses the ordinary machinery with a derived reward
//! (squared TD error of the value learner) and a derived discount
//! `(λ(x')·γ(x'))²`. The three auxiliary predictions then give the gradient
//! of the bias-variance objective with respect to λ at the next state.

use tracing::{debug, warn};

use crate::{
    Error, Result,
    mta::MtaConfig,
    ports::{Learner, StepOutcome, Transition},
    td::{LambdaFunction, TraceLearner, TraceStep},
    types::Features,
};

/// Predictions of the four learners at one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetaPredictions {
    pub value: f64,
    pub lambda_expectation: f64,
    pub mc_expectation: f64,
    pub lambda_variance: f64,
}

/// Coefficient of ∂λ(x')/∂θ in the meta-objective gradient.
///
/// ```text
/// γ'²·λ'·[(v − E_λ)² + Var_λ] + v·(E_λ + E_MC) − v² − E_λ·E_MC
/// ```
pub fn meta_coefficient(gamma_next: f64, lambda_next: f64, p: MetaPredictions) -> f64 {
    let MetaPredictions {
        value: v,
        lambda_expectation: exp_l,
        mc_expectation: exp_mc,
        lambda_variance: var_l,
    } = p;
    gamma_next.powi(2) * lambda_next * ((v - exp_l).powi(2) + var_l) + v * (exp_l + exp_mc)
        - v.powi(2)
        - exp_l * exp_mc
}

/// Initial weights for the four learners, for seeding controlled predictions.
#[derive(Debug, Clone)]
pub struct LearnerWeights {
    pub value: Features,
    pub mc_expectation: Features,
    pub lambda_expectation: Features,
    pub lambda_variance: Features,
}

/// Drives the value learner while adapting λ by meta-gradient descent.
#[derive(Debug, Clone)]
pub struct MtaController {
    config: MtaConfig,
    value: TraceLearner,
    mc_expectation: TraceLearner,
    lambda_expectation: TraceLearner,
    lambda_variance: TraceLearner,
    lambda: LambdaFunction,
    overflow_skips: usize,
}

impl MtaController {
    /// Create a controller with zero-initialised learners sized to `lambda`.
    pub fn new(config: MtaConfig, lambda: LambdaFunction) -> Result<Self> {
        let dim = lambda.dim();
        Self::with_learners(
            config,
            lambda,
            LearnerWeights {
                value: Features::zeros(dim),
                mc_expectation: Features::zeros(dim),
                lambda_expectation: Features::zeros(dim),
                lambda_variance: Features::zeros(dim),
            },
        )
    }

    /// Create a controller whose learners start from the given weights.
    pub fn with_learners(
        config: MtaConfig,
        lambda: LambdaFunction,
        weights: LearnerWeights,
    ) -> Result<Self> {
        config.validate()?;
        let dim = lambda.dim();
        for (name, w) in [
            ("value", &weights.value),
            ("mc-expectation", &weights.mc_expectation),
            ("lambda-expectation", &weights.lambda_expectation),
            ("lambda-variance", &weights.lambda_variance),
        ] {
            if w.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    got: w.len(),
                    context: format!("{name} initial weights"),
                });
            }
        }

        Ok(Self {
            config,
            value: TraceLearner::with_weights("value", weights.value),
            mc_expectation: TraceLearner::with_weights("mc-expectation", weights.mc_expectation),
            lambda_expectation: TraceLearner::with_weights(
                "lambda-expectation",
                weights.lambda_expectation,
            ),
            lambda_variance: TraceLearner::with_weights(
                "lambda-variance",
                weights.lambda_variance,
            ),
            lambda,
            overflow_skips: 0,
        })
    }

    pub fn config(&self) -> &MtaConfig {
        &self.config
    }

    pub fn value_learner(&self) -> &TraceLearner {
        &self.value
    }

    pub fn mc_expectation_learner(&self) -> &TraceLearner {
        &self.mc_expectation
    }

    pub fn lambda_expectation_learner(&self) -> &TraceLearner {
        &self.lambda_expectation
    }

    pub fn lambda_variance_learner(&self) -> &TraceLearner {
        &self.lambda_variance
    }

    /// Committed predictions of all four learners at `x`.
    pub fn predictions(&self, x: &Features) -> Result<MetaPredictions> {
        Ok(MetaPredictions {
            value: self.value.predict(x)?,
            lambda_expectation: self.lambda_expectation.predict(x)?,
            mc_expectation: self.mc_expectation.predict(x)?,
            lambda_variance: self.lambda_variance.predict(x)?,
        })
    }

    fn learners_mut(&mut self) -> [&mut TraceLearner; 4] {
        [
            &mut self.mc_expectation,
            &mut self.lambda_expectation,
            &mut self.lambda_variance,
            &mut self.value,
        ]
    }

    /// Learn the second moment of the λ-return from the value learner's TD
    /// error. Returns whether the variance learner has an update to commit.
    fn learn_variance(&mut self, t: &Transition<'_>, lambda_next: f64) -> Result<bool> {
        let w = self.value.weights();
        let delta = t.reward + t.gamma_next * t.x_next.dot(w) - t.x_curr.dot(w);
        let r_bar = delta * delta;

        if !r_bar.is_finite() {
            self.record_overflow(delta);
            return Ok(false);
        }

        let gamma_bar = (lambda_next * t.gamma_next).powi(2);
        let update = self.lambda_variance.learn(
            TraceStep {
                reward: r_bar,
                gamma_next: gamma_bar,
                gamma_curr: 1.0,
                x_next: t.x_next,
                x_curr: t.x_curr,
                lambda_next: 1.0,
                lambda_curr: 1.0,
                rho: t.rho,
            },
            self.config.step_sizes(),
        );

        match update {
            Ok(()) => Ok(true),
            Err(Error::NonFiniteUpdate { .. }) => {
                self.record_overflow(delta);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    fn record_overflow(&mut self, delta: f64) {
        self.overflow_skips += 1;
        warn!(
            delta,
            skips = self.overflow_skips,
            "variance signal overflowed; skipping variance update for this step"
        );
    }
}

impl Learner for MtaController {
    fn name(&self) -> &str {
        "mta"
    }

    fn begin_episode(&mut self) {
        for learner in self.learners_mut() {
            learner.reset();
        }
    }

    fn step(&mut self, t: &Transition<'_>) -> Result<StepOutcome> {
        let rates = self.config.step_sizes();
        let lambda_curr = self.lambda.value(t.x_curr)?;
        let lambda_next = self.lambda.value(t.x_next)?;

        let step = TraceStep {
            reward: t.reward,
            gamma_next: t.gamma_next,
            gamma_curr: t.gamma_curr,
            x_next: t.x_next,
            x_curr: t.x_curr,
            lambda_next: 1.0,
            lambda_curr: 1.0,
            rho: t.rho,
        };

        self.mc_expectation.learn(step, rates)?;
        self.lambda_expectation.learn(
            TraceStep {
                lambda_next,
                lambda_curr,
                ..step
            },
            rates.scaled(self.config.lambda_step_scale),
        )?;
        let variance_pending = self.learn_variance(t, lambda_next)?;

        let importance_weight = t.log_rho_accu.exp();
        if importance_weight > self.config.trust_region {
            debug!(
                importance_weight,
                trust_region = self.config.trust_region,
                "importance weight left the trust region; ending episode"
            );
            return Ok(StepOutcome::Halted);
        }

        let coefficient =
            meta_coefficient(t.gamma_next, lambda_next, self.predictions(t.x_next)?);
        // θ is replaced only once every learner has a pending update
        let mut adapted = self.lambda.clone();
        adapted.gradient_descent(
            t.x_next,
            self.config.kappa * importance_weight * coefficient,
        )?;

        self.value.learn(
            TraceStep {
                lambda_next: adapted.value(t.x_next)?,
                lambda_curr: adapted.value(t.x_curr)?,
                ..step
            },
            rates,
        )?;

        self.lambda = adapted;
        self.mc_expectation.commit()?;
        self.lambda_expectation.commit()?;
        if variance_pending {
            self.lambda_variance.commit()?;
        }
        self.value.commit()?;
        Ok(StepOutcome::Committed)
    }

    fn value_weights(&self) -> &Features {
        self.value.weights()
    }

    fn lambda(&self) -> &LambdaFunction {
        &self.lambda
    }

    fn overflow_skips(&self) -> usize {
        self.overflow_skips
    }
}
