//! True-online GTD(λ) learner for a single scalar target
//!
//! The learner keeps two committed snapshots of its temporal state (`latest`
//! and `earlier`) plus an optional `pending` snapshot produced by
//! [`TraceLearner::learn`]. Nothing committed changes until
//! [`TraceLearner::commit`] promotes the pending snapshot.
//!
//! ## Update rule
//!
//! With `w_curr`, `h_curr`, `e_prev`, `e_grad_prev`, `e_h_prev`, `ρ_prev` taken
//! from `latest` and `w_prev` from `earlier`:
//!
//! ```text
//! δ      = R' + γ'·(x'·w) − x·w
//! e      = ρ·[γλ·e_prev + α·(1 − ργλ·(x·e_prev))·x]
//! e_grad = ρ·[γλ·e_grad_prev + x]
//! e_h    = ρ_prev·γλ·e_h_prev + β·(1 − ρ_prev·γλ·(x·e_h_prev))·x
//! w'     = w + δ·e + [(w·x) − (w_prev·x)]·(e − αρ·x) − αγ'(1−λ')·(h·e_grad)·x'
//! h'     = h + ρδ·e_h − β·(x·h)·x
//! ```

use crate::{
    Error, Result,
    types::{Features, StepSizes, ensure_dim},
};

/// One transition as seen by a Trace Learner.
#[derive(Debug, Clone, Copy)]
pub struct TraceStep<'a> {
    /// Reward received on the transition (`R_next`)
    pub reward: f64,
    /// Discount at the next feature (`γ_next`)
    pub gamma_next: f64,
    /// Discount at the current feature (`γ_curr`)
    pub gamma_curr: f64,
    pub x_next: &'a Features,
    pub x_curr: &'a Features,
    /// Trace decay at the next feature (`λ_next`)
    pub lambda_next: f64,
    /// Trace decay at the current feature (`λ_curr`)
    pub lambda_curr: f64,
    /// Importance-sampling ratio of the action just taken (`ρ_curr`)
    pub rho: f64,
}

impl TraceStep<'_> {
    fn validate(&self, dim: usize, learner: &str) -> Result<()> {
        ensure_dim(self.x_next, dim, &format!("{learner} x_next"))?;
        ensure_dim(self.x_curr, dim, &format!("{learner} x_curr"))?;

        for (name, value) in [
            ("gamma_next", self.gamma_next),
            ("gamma_curr", self.gamma_curr),
            ("lambda_next", self.lambda_next),
            ("lambda_curr", self.lambda_curr),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::invalid_parameter(name, value, "must lie in [0, 1]"));
            }
        }

        if !(self.rho.is_finite() && self.rho >= 0.0) {
            return Err(Error::invalid_parameter(
                "rho",
                self.rho,
                "importance ratio must be non-negative and finite",
            ));
        }
        Ok(())
    }
}

/// Complete temporal state of a learner after some number of commits.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSnapshot {
    /// Weight vector
    pub w: Features,
    /// Gradient-correction vector
    pub h: Features,
    /// Eligibility trace for `w`
    pub e: Features,
    /// Trace of raw feature directions used by the correction term
    pub e_grad: Features,
    /// Eligibility trace for `h`
    pub e_h: Features,
    /// Importance ratio of the step that produced this snapshot
    pub rho: f64,
}

impl TraceSnapshot {
    fn zeros(dim: usize) -> Self {
        Self::with_weights(Features::zeros(dim))
    }

    fn with_weights(w: Features) -> Self {
        let dim = w.len();
        Self {
            w,
            h: Features::zeros(dim),
            e: Features::zeros(dim),
            e_grad: Features::zeros(dim),
            e_h: Features::zeros(dim),
            rho: 1.0,
        }
    }

    fn clear_traces(&mut self) {
        self.e.fill(0.0);
        self.e_grad.fill(0.0);
        self.e_h.fill(0.0);
        self.rho = 1.0;
    }

    fn is_finite(&self) -> bool {
        self.rho.is_finite()
            && [&self.w, &self.h, &self.e, &self.e_grad, &self.e_h]
                .iter()
                .all(|v| v.iter().all(|x| x.is_finite()))
    }
}

/// True-online GTD(λ) learner with explicit compute-then-commit state.
#[derive(Debug, Clone)]
pub struct TraceLearner {
    name: String,
    dim: usize,
    latest: TraceSnapshot,
    earlier: TraceSnapshot,
    pending: Option<TraceSnapshot>,
}

impl TraceLearner {
    /// Create a learner with zero weights.
    pub fn new(name: impl Into<String>, dim: usize) -> Self {
        Self {
            name: name.into(),
            dim,
            latest: TraceSnapshot::zeros(dim),
            earlier: TraceSnapshot::zeros(dim),
            pending: None,
        }
    }

    /// Create a learner whose current and previous weights are `w`.
    pub fn with_weights(name: impl Into<String>, w: Features) -> Self {
        Self {
            name: name.into(),
            dim: w.len(),
            earlier: TraceSnapshot::with_weights(w.clone()),
            latest: TraceSnapshot::with_weights(w),
            pending: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Committed weight vector (`w_curr`).
    pub fn weights(&self) -> &Features {
        &self.latest.w
    }

    /// Committed gradient-correction vector (`h_curr`).
    pub fn auxiliary(&self) -> &Features {
        &self.latest.h
    }

    /// Linear prediction `x · w_curr` from committed weights.
    pub fn predict(&self, x: &Features) -> Result<f64> {
        ensure_dim(x, self.dim, &self.name)?;
        Ok(x.dot(&self.latest.w))
    }

    pub fn latest(&self) -> &TraceSnapshot {
        &self.latest
    }

    pub fn earlier(&self) -> &TraceSnapshot {
        &self.earlier
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Compute the provisional next state for one transition.
    ///
    /// Committed state is untouched; a previously pending update that was
    /// never committed is replaced.
    ///
    /// # Errors
    ///
    /// Fails on dimension mismatch, out-of-range parameters, or when the
    /// update would produce a non-finite value. Nothing is stored on failure.
    pub fn learn(&mut self, step: TraceStep<'_>, rates: StepSizes) -> Result<()> {
        step.validate(self.dim, &self.name)?;
        rates.validate()?;

        let next = self.compute(&step, rates);
        if !next.is_finite() {
            return Err(Error::NonFiniteUpdate {
                learner: self.name.clone(),
            });
        }
        self.pending = Some(next);
        Ok(())
    }

    /// Promote the pending update: `latest → earlier`, `pending → latest`.
    pub fn commit(&mut self) -> Result<()> {
        let next = self.pending.take().ok_or_else(|| Error::NothingToCommit {
            learner: self.name.clone(),
        })?;
        self.earlier = std::mem::replace(&mut self.latest, next);
        Ok(())
    }

    /// Episode boundary: zero every trace, reset the previous ratio to 1.
    ///
    /// `w` and `h` carry over to the next episode.
    pub fn reset(&mut self) {
        self.latest.clear_traces();
        self.earlier.clear_traces();
        self.pending = None;
    }

    fn compute(&self, step: &TraceStep<'_>, rates: StepSizes) -> TraceSnapshot {
        let StepSizes { alpha, beta } = rates;
        let TraceStep {
            reward,
            gamma_next,
            gamma_curr,
            x_next,
            x_curr,
            lambda_next,
            lambda_curr,
            rho,
        } = *step;

        let w_curr = &self.latest.w;
        let w_prev = &self.earlier.w;
        let h_curr = &self.latest.h;
        let e_prev = &self.latest.e;
        let e_grad_prev = &self.latest.e_grad;
        let e_h_prev = &self.latest.e_h;
        let rho_prev = self.latest.rho;

        let decay = gamma_curr * lambda_curr;
        let delta = reward + gamma_next * x_next.dot(w_curr) - x_curr.dot(w_curr);

        let e = (e_prev * decay + x_curr * (alpha * (1.0 - rho * decay * x_curr.dot(e_prev))))
            * rho;
        let e_grad = (e_grad_prev * decay + x_curr) * rho;
        let e_h = e_h_prev * (rho_prev * decay)
            + x_curr * (beta * (1.0 - rho_prev * decay * x_curr.dot(e_h_prev)));

        let online_correction = w_curr.dot(x_curr) - w_prev.dot(x_curr);
        let gradient_correction = alpha * gamma_next * (1.0 - lambda_next) * h_curr.dot(&e_grad);
        let w = w_curr
            + &e * delta
            + (&e - x_curr * (alpha * rho)) * online_correction
            - x_next * gradient_correction;
        let h = h_curr + &e_h * (rho * delta) - x_curr * (beta * x_curr.dot(h_curr));

        TraceSnapshot {
            w,
            h,
            e,
            e_grad,
            e_h,
            rho,
        }
    }
}
