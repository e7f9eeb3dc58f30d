use serde::{Deserialize, Serialize};

use crate::orchestration::StepFailureKind;

/// Events that can trigger task state transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TaskEvent {
    /// The first step is about to be dispatched
    Start,
    /// Every step completed
    Complete,
    /// Some but not all steps completed
    PartiallyFail,
    /// Nothing completed, with the reason
    Fail(String),
    /// Peers were resolved but no step was planned
    NothingToDispatch,
    /// The caller disconnected
    Cancel,
}

impl TaskEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::PartiallyFail => "partially_fail",
            Self::Fail(_) => "fail",
            Self::NothingToDispatch => "nothing_to_dispatch",
            Self::Cancel => "cancel",
        }
    }

    /// Extract error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }

    /// Check if this event represents a terminal transition
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Start)
    }

    /// Create a failure event with the given reason
    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }

    /// Pick the terminal event for a finished plan from its step tally
    pub fn from_tally(completed: usize, total: usize) -> Self {
        if total > 0 && completed == total {
            Self::Complete
        } else if completed > 0 {
            Self::PartiallyFail
        } else {
            Self::Fail(format!("all {total} dispatch steps failed"))
        }
    }
}

/// Events that can trigger dispatch step state transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StepEvent {
    /// The message is about to be sent
    Start,
    /// The peer replied, carrying its reply text
    Complete(String),
    /// The dispatch failed
    Fail {
        kind: StepFailureKind,
        detail: String,
    },
}

impl StepEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete(_) => "complete",
            Self::Fail { .. } => "fail",
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Start)
    }

    /// Create a failure event of the given kind
    pub fn fail_with_error(kind: StepFailureKind, detail: impl Into<String>) -> Self {
        Self::Fail {
            kind,
            detail: detail.into(),
        }
    }
}
