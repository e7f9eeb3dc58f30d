use chrono::Utc;
use tracing::debug;

use super::{
    errors::{StateMachineError, StateMachineResult},
    events::StepEvent,
    states::StepState,
};
use crate::models::{DispatchStep, StepError};

/// State machine for a single dispatch step.
///
/// Borrows the step mutably for the duration of one transition; the owning
/// [`TaskStateMachine`](super::TaskStateMachine) decides which step may move.
pub struct StepStateMachine<'a> {
    step: &'a mut DispatchStep,
}

impl<'a> StepStateMachine<'a> {
    pub fn new(step: &'a mut DispatchStep) -> Self {
        Self { step }
    }

    pub fn current_state(&self) -> StepState {
        self.step.status
    }

    /// Attempt to transition the step, recording reply text or failure detail
    pub fn transition(&mut self, event: StepEvent) -> StateMachineResult<StepState> {
        let current_state = self.current_state();
        let target_state = Self::determine_target_state(current_state, &event)?;
        let now = Utc::now();

        match event {
            StepEvent::Start => self.step.started_at = Some(now),
            StepEvent::Complete(text) => {
                self.step.response = Some(text);
                self.step.finished_at = Some(now);
            }
            StepEvent::Fail { kind, detail } => {
                self.step.error = Some(StepError { kind, detail });
                self.step.finished_at = Some(now);
            }
        }
        self.step.status = target_state;

        debug!(
            step_id = %self.step.step_id,
            from = %current_state,
            to = %target_state,
            "Step transition applied"
        );

        Ok(target_state)
    }

    /// Determine the target state based on current state and event
    pub fn determine_target_state(
        current_state: StepState,
        event: &StepEvent,
    ) -> StateMachineResult<StepState> {
        let target = match (current_state, event) {
            (StepState::Pending, StepEvent::Start) => StepState::Working,

            (StepState::Working, StepEvent::Complete(_)) => StepState::Completed,

            (StepState::Working, StepEvent::Fail { .. }) => StepState::Failed,
            // Failed without being attempted, e.g. when the execution budget is spent
            (StepState::Pending, StepEvent::Fail { .. }) => StepState::Failed,

            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: Some(from_state.to_string()),
                    to: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }

    pub fn step(&self) -> &DispatchStep {
        &*self.step
    }
}
