//! Shared orchestration types: step outcomes, failure kinds and the planning error.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::state_machine::StepEvent;

/// Why a dispatch step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepFailureKind {
    /// Connection refused, DNS failure, non-success HTTP status
    Unreachable,
    /// No reply within the step timeout or remaining task budget
    Timeout,
    /// The peer replied with an explicit error
    RejectedByPeer,
    /// The peer replied with something that is not a usable A2A response
    MalformedResponse,
}

impl StepFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unreachable => "unreachable",
            Self::Timeout => "timeout",
            Self::RejectedByPeer => "rejected_by_peer",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

impl fmt::Display for StepFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of executing one step. Steps never fail by panicking or erroring out of the
/// executor; every attempt settles into one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success {
        reply: String,
    },
    Failure {
        kind: StepFailureKind,
        detail: String,
    },
}

impl StepOutcome {
    pub fn success(reply: impl Into<String>) -> Self {
        Self::Success {
            reply: reply.into(),
        }
    }

    pub fn failure(kind: StepFailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// State machine event recording this outcome
    pub fn to_step_event(&self) -> StepEvent {
        match self {
            Self::Success { reply } => StepEvent::Complete(reply.clone()),
            Self::Failure { kind, detail } => StepEvent::fail_with_error(*kind, detail.clone()),
        }
    }
}

/// Text reply extracted from a peer's response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReply {
    pub text: String,
}

impl PeerReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanningError {
    #[error("No peers available for planning")]
    NoPeersAvailable,

    #[error("Step {step_id} targets {address}, which was not resolved for this run")]
    UnresolvedTarget { step_id: String, address: String },
}
