//! Ports (trait boundaries) for external collaborators.
//!
//! The learning core owns these interfaces; environments, encoders,
//! discount schedules, evaluators, samplers and observers are adapters that
//! implement them.

pub mod environment;
pub mod learner;
pub mod observer;
pub mod strategies;

pub use environment::{EnvStep, Environment};
pub use learner::{Learner, StepOutcome, Transition};
pub use observer::{EpisodeSummary, Observer, StepEvent};
pub use strategies::{ActionSampler, DiscountSchedule, Evaluator, FeatureEncoder};
