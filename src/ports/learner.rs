//! Learner port - abstraction over episode-driven value learners
//!
//! The run orchestrator owns the episode loop (environment, sampling,
//! importance ratios) and hands each transition to a [`Learner`]. This lets
//! the same pipeline drive both the meta-trace-adapting controller and the
//! fixed-λ baseline.

use crate::{
    Result,
    td::LambdaFunction,
    types::Features,
};

/// One environment transition, already encoded and discounted.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    pub x_curr: &'a Features,
    pub x_next: &'a Features,
    pub reward: f64,
    /// γ(x_curr)
    pub gamma_curr: f64,
    /// γ(x_next)
    pub gamma_next: f64,
    /// Importance ratio of the action taken from `x_curr`
    pub rho: f64,
    /// Running sum of log importance ratios for the episode, this step included
    pub log_rho_accu: f64,
}

/// What happened to a step handed to a learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// All updates for the step were committed.
    Committed,
    /// The learner refused to trust further updates this episode.
    Halted,
}

/// Learner trait - Unified interface for value learners
///
/// # Examples
///
/// ```no_run
/// use meta_trace::ports::Learner;
///
/// fn describe(learner: &dyn Learner) -> String {
///     format!("{} over {} features", learner.name(), learner.value_weights().len())
/// }
/// ```
pub trait Learner: Send {
    /// Get the learner's name.
    fn name(&self) -> &str;

    /// Called once at the start of every episode, before any step.
    ///
    /// Implementations reset eligibility traces here; weights persist.
    fn begin_episode(&mut self);

    /// Learn from one transition.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed inputs (dimension mismatch, invalid
    /// ratios). Tolerated numerical degeneracies are not errors.
    fn step(&mut self, transition: &Transition<'_>) -> Result<StepOutcome>;

    /// Committed weights of the value estimate.
    fn value_weights(&self) -> &Features;

    /// The trace-decay function used by the learner.
    fn lambda(&self) -> &LambdaFunction;

    /// Number of variance-signal updates skipped because of overflow.
    ///
    /// # Default Implementation
    ///
    /// Returns 0, suitable for learners without a variance signal.
    fn overflow_skips(&self) -> usize {
        0
    }
}
