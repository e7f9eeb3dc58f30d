//! # Task Model
//!
//! A `Task` is one incoming request plus the ordered steps planned for it. It is owned by
//! exactly one orchestrator run; mutation goes through
//! [`TaskStateMachine`](crate::state_machine::TaskStateMachine), and everyone else sees
//! [`TaskSnapshot`] copies.
//!
//! Step statuses always form a prefix of finished steps, then at most one `Working` step,
//! then `Pending` steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::peer::PeerRef;
use super::request::DispatchRequest;
use crate::orchestration::StepFailureKind;
use crate::state_machine::{StepState, TaskState};

/// Typed failure recorded on a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    pub kind: StepFailureKind,
    pub detail: String,
}

/// One unit of dispatch work targeting exactly one peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStep {
    pub step_id: String,
    pub ordinal: usize,
    /// Planning rule that produced this step
    pub rule: String,
    pub target: PeerRef,
    pub message: String,
    pub status: StepState,
    pub response: Option<String>,
    pub error: Option<StepError>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DispatchStep {
    pub fn new(
        task_id: &str,
        ordinal: usize,
        rule: impl Into<String>,
        target: PeerRef,
        message: impl Into<String>,
    ) -> Self {
        Self {
            step_id: format!("{task_id}-step-{ordinal}"),
            ordinal,
            rule: rule.into(),
            target,
            message: message.into(),
            status: StepState::Pending,
            response: None,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub(crate) task_id: String,
    pub(crate) context_id: String,
    pub(crate) request: DispatchRequest,
    pub(crate) steps: Vec<DispatchStep>,
    pub(crate) current_step: usize,
    pub(crate) status: TaskState,
    pub(crate) status_reason: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a pending task, reusing the request's context id when it carries one
    pub fn new(request: DispatchRequest) -> Self {
        let now = Utc::now();
        let context_id = request
            .context_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            task_id: Uuid::new_v4().to_string(),
            context_id,
            request,
            steps: Vec::new(),
            current_step: 0,
            status: TaskState::Pending,
            status_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn request(&self) -> &DispatchRequest {
        &self.request
    }

    pub fn steps(&self) -> &[DispatchStep] {
        &self.steps
    }

    pub fn status(&self) -> TaskState {
        self.status
    }

    pub fn status_reason(&self) -> Option<&str> {
        self.status_reason.as_deref()
    }

    /// Index of the next step to dispatch (equal to the plan length once exhausted)
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn completed_count(&self) -> usize {
        count_status(&self.steps, StepState::Completed)
    }

    pub fn failed_count(&self) -> usize {
        count_status(&self.steps, StepState::Failed)
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            task_id: self.task_id.clone(),
            context_id: self.context_id.clone(),
            request: self.request.clone(),
            steps: self.steps.clone(),
            current_step: self.current_step,
            status: self.status,
            status_reason: self.status_reason.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only copy of a task handed to the store and the web layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: String,
    pub context_id: String,
    pub request: DispatchRequest,
    pub steps: Vec<DispatchStep>,
    pub current_step: usize,
    pub status: TaskState,
    pub status_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskSnapshot {
    pub fn completed_count(&self) -> usize {
        count_status(&self.steps, StepState::Completed)
    }

    pub fn failed_count(&self) -> usize {
        count_status(&self.steps, StepState::Failed)
    }

    /// Check the ordering invariant over step statuses
    pub fn has_ordered_step_statuses(&self) -> bool {
        step_statuses_are_ordered(self.steps.iter().map(|step| step.status))
    }
}

fn count_status(steps: &[DispatchStep], status: StepState) -> usize {
    steps.iter().filter(|step| step.status == status).count()
}

/// True when statuses read: finished*, at most one Working, then Pending*
pub fn step_statuses_are_ordered(statuses: impl IntoIterator<Item = StepState>) -> bool {
    // 0 = finished prefix, 1 = after the working step, 2 = pending suffix
    let mut phase = 0;
    for status in statuses {
        match status {
            StepState::Completed | StepState::Failed if phase == 0 => {}
            StepState::Working if phase == 0 => phase = 1,
            StepState::Pending => phase = 2,
            _ => return false,
        }
    }
    true
}
