//! Environment port - the episodic simulation the orchestrator drives

use crate::Result;

/// Result of taking one action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvStep {
    pub observation: usize,
    pub reward: f64,
    pub done: bool,
}

/// Finite, episodic environment with discrete observations and actions.
pub trait Environment: Send {
    /// Size of the observation space.
    fn num_states(&self) -> usize;

    /// Size of the action space.
    fn num_actions(&self) -> usize;

    /// Start a new episode and return the initial observation.
    fn reset(&mut self) -> usize;

    /// Apply `action` from the current observation.
    ///
    /// # Errors
    ///
    /// Returns an error if `action` is out of range.
    fn step(&mut self, action: usize) -> Result<EnvStep>;
}
