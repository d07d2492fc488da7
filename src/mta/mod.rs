//! Meta-Trace-Adaptation (MTA)
//!
//! Adapts the trace-decay function λ(x) online by descending the gradient of
//! a bias-variance objective, estimated from three auxiliary Trace Learners
//! that run alongside the value learner.

pub mod config;
pub mod controller;

pub use config::MtaConfig;
pub use controller::{LearnerWeights, MetaPredictions, MtaController, meta_coefficient};
