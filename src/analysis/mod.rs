//! Analysis tools for scoring learned value estimates
//!
//! Exact ground truth for small Markov chains and the statistics used to
//! aggregate learning curves across independent runs.

pub mod ground_truth;
pub mod stats;

pub use ground_truth::{GroundTruth, MarkovChain};
pub use stats::{EpisodeStats, summarize, tail_mean, weighted_mse};
