//! Training and experiment pipeline abstractions
//!
//! This module provides composable pipelines for:
//! - Running one learner through a sequence of episodes
//! - Running many independent runs in parallel and aggregating them
//! - Recording observations during training

pub mod experiment;
pub mod observers;
pub mod scenarios;
pub mod training;

pub use experiment::{
    Algorithm, ErrorMetric, ExperimentConfig, ExperimentResult, ExperimentRunner, RunSetup,
};
// Re-export observer implementations (adapters)
pub use observers::{
    EpisodeRecord, JsonlObserver, MetricsObserver, MetricsSummary, ProgressObserver,
};
pub use scenarios::RandomWalkTask;
pub use training::{Scenario, TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::{Learner, Observer};
