use chrono::Utc;
use tracing::debug;

use super::{
    errors::{StateMachineError, StateMachineResult},
    events::{StepEvent, TaskEvent},
    states::{StepState, TaskState},
    step_state_machine::StepStateMachine,
};
use crate::models::{DispatchStep, Task, TaskSnapshot};

/// Task state machine; the single source of truth for a run's task and step statuses.
///
/// Owns the [`Task`] exclusively. Step transitions are only accepted for the step at
/// the current index, which keeps step statuses in declared order with at most one
/// step `Working`.
#[derive(Debug)]
pub struct TaskStateMachine {
    task: Task,
}

impl TaskStateMachine {
    pub fn new(task: Task) -> Self {
        Self { task }
    }

    pub fn current_state(&self) -> TaskState {
        self.task.status
    }

    /// Install the plan produced by the planner. Allowed once, while pending.
    pub fn install_plan(&mut self, steps: Vec<DispatchStep>) -> StateMachineResult<()> {
        if self.task.status != TaskState::Pending {
            return Err(StateMachineError::guard(format!(
                "plan can only be installed on a pending task, task is {}",
                self.task.status
            )));
        }
        if !self.task.steps.is_empty() {
            return Err(StateMachineError::guard("plan already installed"));
        }
        if let Some(step) = steps
            .iter()
            .enumerate()
            .find(|(index, step)| step.ordinal != *index || step.status != StepState::Pending)
            .map(|(_, step)| step)
        {
            return Err(StateMachineError::guard(format!(
                "step {} is out of order or not pending",
                step.step_id
            )));
        }

        self.task.steps = steps;
        self.task.current_step = 0;
        self.task.updated_at = Utc::now();
        Ok(())
    }

    /// Attempt to transition the task state
    pub fn transition(&mut self, event: TaskEvent) -> StateMachineResult<TaskState> {
        let current_state = self.current_state();
        let target_state = self.determine_target_state(current_state, &event)?;

        self.check_guards(current_state, target_state, &event)?;

        self.task.status = target_state;
        self.task.status_reason = event.error_message().map(str::to_string);
        self.task.updated_at = Utc::now();

        debug!(
            task_id = %self.task.task_id,
            from = %current_state,
            to = %target_state,
            event = event.event_type(),
            "Task transition applied"
        );

        Ok(target_state)
    }

    /// Force a non-terminal task into `Failed`, bypassing guards. Only for runs that hit
    /// an internal error and can no longer follow the normal lifecycle.
    pub fn abort(&mut self, reason: impl Into<String>) -> StateMachineResult<TaskState> {
        if self.is_terminal() {
            return Err(StateMachineError::InvalidTransition {
                from: Some(self.task.status.to_string()),
                to: TaskState::Failed.to_string(),
            });
        }
        self.task.status = TaskState::Failed;
        self.task.status_reason = Some(reason.into());
        self.task.updated_at = Utc::now();
        Ok(TaskState::Failed)
    }

    /// Determine the target state based on current state and event
    pub fn determine_target_state(
        &self,
        current_state: TaskState,
        event: &TaskEvent,
    ) -> StateMachineResult<TaskState> {
        let target = match (current_state, event) {
            (TaskState::Pending, TaskEvent::Start) => TaskState::Working,

            (TaskState::Working, TaskEvent::Complete) => TaskState::Completed,
            (TaskState::Working, TaskEvent::PartiallyFail) => TaskState::PartiallyFailed,

            (TaskState::Working, TaskEvent::Fail(_)) => TaskState::Failed,
            (TaskState::Pending, TaskEvent::Fail(_)) => TaskState::Failed,

            (TaskState::Pending, TaskEvent::NothingToDispatch) => TaskState::NothingToDispatch,

            (TaskState::Pending, TaskEvent::Cancel) => TaskState::Cancelled,
            (TaskState::Working, TaskEvent::Cancel) => TaskState::Cancelled,

            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: Some(from_state.to_string()),
                    to: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }

    fn check_guards(
        &self,
        current_state: TaskState,
        target_state: TaskState,
        event: &TaskEvent,
    ) -> StateMachineResult<()> {
        let total = self.task.steps.len();
        let completed = self.task.completed_count();
        let finished = completed + self.task.failed_count();

        match (current_state, target_state, event) {
            (TaskState::Pending, TaskState::Working, TaskEvent::Start) if total == 0 => {
                Err(StateMachineError::guard("cannot start a task with an empty plan"))
            }
            (TaskState::Pending, TaskState::Failed, _) if total > 0 => Err(
                StateMachineError::guard("a planned task must start before it can fail"),
            ),
            (TaskState::Pending, TaskState::NothingToDispatch, _) if total > 0 => Err(
                StateMachineError::guard("task has a plan, there is something to dispatch"),
            ),
            (TaskState::Working, TaskState::Completed, _) if completed != total => {
                Err(StateMachineError::guard(format!(
                    "only {completed} of {total} steps completed"
                )))
            }
            (TaskState::Working, TaskState::PartiallyFailed, _)
                if finished != total || completed == 0 || completed == total =>
            {
                Err(StateMachineError::guard(format!(
                    "partial failure needs a finished plan with mixed outcomes, \
                     {completed} completed and {finished} finished of {total}"
                )))
            }
            (TaskState::Working, TaskState::Failed, _) if finished != total || completed > 0 => {
                Err(StateMachineError::guard(format!(
                    "failure needs a finished plan with no completed step, \
                     {completed} completed and {finished} finished of {total}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Mark the step at `index` as `Working`. Only the current step may start.
    pub fn start_step(&mut self, index: usize) -> StateMachineResult<&DispatchStep> {
        if self.task.status != TaskState::Working {
            return Err(StateMachineError::guard(format!(
                "steps can only start while the task is working, task is {}",
                self.task.status
            )));
        }
        self.check_current_step(index)?;

        let step = &mut self.task.steps[index];
        StepStateMachine::new(step).transition(StepEvent::Start)?;
        self.task.updated_at = Utc::now();
        Ok(&self.task.steps[index])
    }

    /// Record the outcome of the step at `index` and advance to the next one.
    ///
    /// A pending step may be failed directly; it is never contacted.
    pub fn finish_step(&mut self, index: usize, event: StepEvent) -> StateMachineResult<StepState> {
        if !event.is_terminal() {
            return Err(StateMachineError::InvalidTransition {
                from: None,
                to: event.event_type().to_string(),
            });
        }
        self.check_current_step(index)?;

        let step = &mut self.task.steps[index];
        let state = StepStateMachine::new(step).transition(event)?;
        self.task.current_step = index + 1;
        self.task.updated_at = Utc::now();
        Ok(state)
    }

    fn check_current_step(&self, index: usize) -> StateMachineResult<()> {
        let len = self.task.steps.len();
        if index >= len {
            return Err(StateMachineError::StepNotFound { index, len });
        }
        if index != self.task.current_step {
            return Err(StateMachineError::guard(format!(
                "step {index} is not the current step {}",
                self.task.current_step
            )));
        }
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.current_state().is_terminal()
    }

    /// (finished steps, total steps)
    pub fn progress(&self) -> (usize, usize) {
        (self.task.current_step, self.task.steps.len())
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn task_id(&self) -> &str {
        &self.task.task_id
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        self.task.snapshot()
    }
}
