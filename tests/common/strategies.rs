use proptest::prelude::*;

use dispatch_core::models::{DispatchRequest, DispatchStep, PeerRef, Task};
use dispatch_core::orchestration::StepFailureKind;

/// How one planned step plays out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepScript {
    Succeeds,
    Fails(StepFailureKind),
    /// Budget ran out before the step could start
    Skipped,
}

pub fn failure_kind_strategy() -> impl Strategy<Value = StepFailureKind> {
    prop_oneof![
        Just(StepFailureKind::Unreachable),
        Just(StepFailureKind::Timeout),
        Just(StepFailureKind::RejectedByPeer),
        Just(StepFailureKind::MalformedResponse),
    ]
}

pub fn step_script_strategy() -> impl Strategy<Value = StepScript> {
    prop_oneof![
        3 => Just(StepScript::Succeeds),
        2 => failure_kind_strategy().prop_map(StepScript::Fails),
        1 => Just(StepScript::Skipped),
    ]
}

/// A plan script of 1..=8 steps and an optional cancellation point within it
pub fn run_script_strategy() -> impl Strategy<Value = (Vec<StepScript>, Option<usize>)> {
    prop::collection::vec(step_script_strategy(), 1..=8).prop_flat_map(|steps| {
        let len = steps.len();
        (Just(steps), prop::option::of(0..len))
    })
}

pub fn request_text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z ,.]{1,80}"
}

/// A pending task with `len` planned steps against distinct fake peers
pub fn planned_task(len: usize) -> (Task, Vec<DispatchStep>) {
    let task = Task::new(DispatchRequest::new("Fire on Main St"));
    let steps = (0..len)
        .map(|ordinal| {
            DispatchStep::new(
                task.task_id(),
                ordinal,
                "fire",
                PeerRef {
                    name: format!("Peer {ordinal}"),
                    address: format!("http://127.0.0.1:{}", 9000 + ordinal),
                    endpoint: format!("http://127.0.0.1:{}", 9000 + ordinal),
                },
                "Emergency dispatch: Fire on Main St",
            )
        })
        .collect();
    (task, steps)
}
