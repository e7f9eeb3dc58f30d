// State machines for dispatch tasks and their steps
//
// Task: Pending -> Working -> {Completed, PartiallyFailed, Failed, Cancelled}, plus the
// direct Pending -> {Failed, NothingToDispatch, Cancelled} exits for runs with no plan.
// Step: Pending -> Working -> {Completed, Failed}. All terminal states are final.

pub mod errors;
pub mod events;
pub mod states;
pub mod step_state_machine;
pub mod task_state_machine;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::{StepEvent, TaskEvent};
pub use states::{StepState, TaskState};
pub use step_state_machine::StepStateMachine;
pub use task_state_machine::TaskStateMachine;
