use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::events;
use crate::orchestration::StepFailureKind;
use crate::state_machine::TaskState;

/// Progress event delivered to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Task state snapshot; the last event of every run is a `Status` with `final` set
    Status {
        task_id: String,
        context_id: String,
        state: TaskState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(rename = "final")]
        is_final: bool,
    },
    /// Informational text, including successful step outcomes
    Text {
        task_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
        text: String,
    },
    /// Failure detail, including failed step outcomes
    Error {
        task_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failure: Option<StepFailureKind>,
        detail: String,
    },
}

impl ProgressEvent {
    pub fn status(
        task_id: &str,
        context_id: &str,
        state: TaskState,
        message: impl Into<String>,
    ) -> Self {
        Self::Status {
            task_id: task_id.to_string(),
            context_id: context_id.to_string(),
            state,
            message: Some(message.into()),
            is_final: false,
        }
    }

    pub fn terminal(
        task_id: &str,
        context_id: &str,
        state: TaskState,
        message: impl Into<String>,
    ) -> Self {
        Self::Status {
            task_id: task_id.to_string(),
            context_id: context_id.to_string(),
            state,
            message: Some(message.into()),
            is_final: true,
        }
    }

    pub fn text(task_id: &str, text: impl Into<String>) -> Self {
        Self::Text {
            task_id: task_id.to_string(),
            step_id: None,
            text: text.into(),
        }
    }

    pub fn step_text(task_id: &str, step_id: &str, text: impl Into<String>) -> Self {
        Self::Text {
            task_id: task_id.to_string(),
            step_id: Some(step_id.to_string()),
            text: text.into(),
        }
    }

    pub fn step_error(
        task_id: &str,
        step_id: &str,
        failure: StepFailureKind,
        detail: impl Into<String>,
    ) -> Self {
        Self::Error {
            task_id: task_id.to_string(),
            step_id: Some(step_id.to_string()),
            failure: Some(failure),
            detail: detail.into(),
        }
    }

    /// Stream discriminator: `status`, `message` or `error`
    pub fn stream_name(&self) -> &'static str {
        match self {
            Self::Status { .. } => events::STATUS,
            Self::Text { .. } => events::MESSAGE,
            Self::Error { .. } => events::ERROR,
        }
    }

    pub fn task_id(&self) -> &str {
        match self {
            Self::Status { task_id, .. }
            | Self::Text { task_id, .. }
            | Self::Error { task_id, .. } => task_id,
        }
    }

    /// Step the event reports an outcome for, if any
    pub fn step_id(&self) -> Option<&str> {
        match self {
            Self::Status { .. } => None,
            Self::Text { step_id, .. } | Self::Error { step_id, .. } => step_id.as_deref(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Status { is_final: true, .. })
    }
}

/// A progress event with its position in the run's stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedEvent {
    /// 1-based, gapless within one run
    pub sequence: u64,
    pub emitted_at: DateTime<Utc>,
    pub event: ProgressEvent,
}
