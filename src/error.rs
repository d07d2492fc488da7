//! Error types for the meta-trace crate

use thiserror::Error;

/// Main error type for the meta-trace crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    #[error("invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: String,
        value: f64,
        reason: String,
    },

    #[error("invalid policy matrix '{policy}': {reason}")]
    InvalidPolicy { policy: String, reason: String },

    #[error(
        "behavior policy has zero probability for state {state}, action {action} \
         where the target policy has {target_probability}"
    )]
    PolicySupport {
        state: usize,
        action: usize,
        target_probability: f64,
    },

    #[error("importance ratio undefined: behavior probability is zero at state {state}, action {action}")]
    ZeroBehaviorProbability { state: usize, action: usize },

    #[error("action {action} is out of range for {num_actions} actions")]
    InvalidAction { action: usize, num_actions: usize },

    #[error("observation {observation} is out of range for {num_states} states")]
    InvalidObservation {
        observation: usize,
        num_states: usize,
    },

    #[error("{learner} update produced a non-finite value")]
    NonFiniteUpdate { learner: String },

    #[error("{learner} has no pending update to commit")]
    NothingToCommit { learner: String },

    #[error("linear system for {context} is singular")]
    SingularSystem { context: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },

    #[error("failed to build worker pool: {message}")]
    ThreadPool { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

impl Error {
    pub(crate) fn invalid_parameter(name: &str, value: f64, reason: &str) -> Self {
        Error::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.to_string(),
        }
    }
}
