//! Temporal-difference learning with eligibility traces
//!
//! ## Components
//!
//! - [`TraceLearner`]: true-online GTD(λ) for one scalar target, with
//!   compute-then-commit temporal state
//! - [`LambdaFunction`]: differentiable trace decay λ(x) ∈ (0, 1)
//! - [`TogtdAgent`]: a single learner with a fixed λ(x), used as a baseline
//!
//! ## Usage Example
//!
//! ```
//! use meta_trace::td::{TraceLearner, TraceStep};
//! use meta_trace::types::StepSizes;
//! use meta_trace::utils::one_hot;
//!
//! let mut learner = TraceLearner::new("value", 3);
//! let (x0, x1) = (one_hot(0, 3), one_hot(1, 3));
//! learner.learn(
//!     TraceStep {
//!         reward: 1.0,
//!         gamma_next: 0.9,
//!         gamma_curr: 0.9,
//!         x_next: &x1,
//!         x_curr: &x0,
//!         lambda_next: 0.8,
//!         lambda_curr: 0.8,
//!         rho: 1.0,
//!     },
//!     StepSizes::new(0.1, 0.01),
//! )?;
//! learner.commit()?;
//! assert!(learner.weights()[0] > 0.0);
//! # Ok::<(), meta_trace::Error>(())
//! ```

pub mod lambda;
pub mod togtd;
pub mod trace_learner;

pub use lambda::{LambdaApproximator, LambdaConfig, LambdaFunction};
pub use togtd::{TogtdAgent, TogtdConfig};
pub use trace_learner::{TraceLearner, TraceSnapshot, TraceStep};
