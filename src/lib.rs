//! Off-policy value prediction with adaptive eligibility traces
//!
//! This crate provides:
//! - True-online GTD(λ) Trace Learners with compute-then-commit state
//! - A differentiable trace-decay function λ(x)
//! - Meta-trace adaptation (MTA), which tunes λ(x) online from auxiliary
//!   estimates of the λ-return's bias and variance
//! - A run orchestrator, a parallel multi-run experiment runner, and exact
//!   ground truth for small Markov chains
//!
//! ## Example
//!
//! ```
//! use meta_trace::adapters::CategoricalSampler;
//! use meta_trace::mta::{MtaConfig, MtaController};
//! use meta_trace::pipeline::{RandomWalkTask, TrainingConfig, TrainingPipeline};
//! use meta_trace::td::LambdaFunction;
//!
//! let task = RandomWalkTask::default();
//! let mut scenario = task.scenario()?;
//! let mut agent = MtaController::new(MtaConfig::default(), LambdaFunction::constant(5, 0.9))?;
//! let mut sampler = CategoricalSampler::seeded(7);
//!
//! let mut pipeline = TrainingPipeline::new(TrainingConfig::default().with_episodes(20));
//! let result = pipeline.run(&mut agent, &mut scenario, &mut sampler)?;
//! assert_eq!(result.snapshots.len(), 20);
//! # Ok::<(), meta_trace::Error>(())
//! ```

pub mod adapters;
pub mod analysis;
pub mod cli;
pub mod error;
pub mod mta;
pub mod pipeline;
pub mod policy;
pub mod ports;
pub mod td;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
pub use policy::{PolicyMatrix, PolicyPair};
pub use types::{EvaluationMode, Features, StepSizes, Termination};
