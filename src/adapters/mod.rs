//! Adapters implementing the collaborator ports.
//!
//! Concrete environments, encoders, discount schedules, evaluators and
//! samplers. The learning core depends only on the traits in
//! [`ports`](crate::ports); these implementations make the reference
//! experiments runnable.

pub mod evaluator;
pub mod features;
pub mod random_walk;
pub mod sampler;

pub use evaluator::DistributionEvaluator;
pub use features::{ConstantDiscount, OneHotEncoder, TerminalDiscount};
pub use random_walk::RandomWalk;
pub use sampler::CategoricalSampler;
