//! Observer port - abstraction for training observation and data collection
//!
//! Observers receive read-only views of what happened during a run. They can
//! be composed freely and can never alter learner state.

use serde::{Deserialize, Serialize};

use crate::{Result, types::Termination};

/// A single committed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    pub episode: usize,
    /// Step number within the episode (0-based)
    pub step: usize,
    pub observation: usize,
    pub action: usize,
    pub next_observation: usize,
    pub reward: f64,
    pub rho: f64,
    pub log_rho_accu: f64,
    /// λ at the current observation after the step's updates
    pub lambda: f64,
}

/// Summary of a finished episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    /// Number of committed steps
    pub steps: usize,
    pub termination: Termination,
    pub log_rho_accu: f64,
    /// Variance-signal updates skipped because of overflow in this episode
    pub overflow_skips: usize,
    /// Evaluator reading taken at the start of the episode, if any
    pub evaluation: Option<f64>,
}

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_episodes)` - Once at the beginning
/// 2. For each episode:
///    - `on_episode_start(episode)`
///    - `on_step(...)` - For each committed step
///    - `on_episode_end(summary)`
/// 3. `on_training_end()` - Once at the end
///
/// # Examples
///
/// ```no_run
/// use meta_trace::ports::{EpisodeSummary, Observer};
///
/// struct LengthCounter {
///     total_steps: usize,
/// }
///
/// impl Observer for LengthCounter {
///     fn on_episode_end(&mut self, summary: &EpisodeSummary) -> meta_trace::Result<()> {
///         self.total_steps += summary.steps;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called when training starts.
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    /// Called when an episode starts, after learners were reset.
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        Ok(())
    }

    /// Called after every committed step.
    fn on_step(&mut self, _event: &StepEvent) -> Result<()> {
        Ok(())
    }

    /// Called when an episode ends, for whatever reason.
    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    /// Called when training completes.
    ///
    /// Use this to finalize outputs or display summaries.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
