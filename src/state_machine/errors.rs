use thiserror::Error;

/// Error types for task and step state transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Guard condition failed: {reason}")]
    GuardFailed { reason: String },

    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: Option<String>, to: String },

    #[error("Step {index} does not exist in a plan of {len} steps")]
    StepNotFound { index: usize, len: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StateMachineError {
    pub fn guard(reason: impl Into<String>) -> Self {
        Self::GuardFailed {
            reason: reason.into(),
        }
    }
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
