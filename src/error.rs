//! # Crate Error Types
//!
//! Each subsystem owns a `thiserror` enum; [`DispatchError`] aggregates them so callers
//! that cross subsystem boundaries can use a single [`Result`] alias.

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::discovery::ResolutionFailure;
use crate::events::EmitError;
use crate::orchestration::{PlanningError, TransportError};
use crate::persistence::StoreError;
use crate::registry::RegistryError;
use crate::state_machine::StateMachineError;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] ResolutionFailure),

    #[error("Planning error: {0}")]
    Planning(#[from] PlanningError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("State transition error: {0}")]
    StateMachine(#[from] StateMachineError),

    #[error("Event error: {0}")]
    Emit(#[from] EmitError),

    #[error("Task store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DispatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
