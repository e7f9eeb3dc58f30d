use proptest::prelude::*;

use dispatch_core::models::task::step_statuses_are_ordered;
use dispatch_core::state_machine::{StepEvent, StepState, TaskEvent, TaskState, TaskStateMachine};

use crate::common::strategies::{planned_task, run_script_strategy, StepScript};

fn step_state_strategy() -> impl Strategy<Value = StepState> {
    prop_oneof![
        Just(StepState::Pending),
        Just(StepState::Working),
        Just(StepState::Completed),
        Just(StepState::Failed),
    ]
}

proptest! {
    /// Property: driving a plan step by step keeps statuses as finished*, Working?, Pending*
    #[test]
    fn step_statuses_stay_ordered_through_a_run((script, cancel_at) in run_script_strategy()) {
        let (task, steps) = planned_task(script.len());
        let mut machine = TaskStateMachine::new(task);
        machine.install_plan(steps).unwrap();
        machine.transition(TaskEvent::Start).unwrap();
        prop_assert!(machine.snapshot().has_ordered_step_statuses());

        let mut cancelled = false;
        for (index, step) in script.iter().enumerate() {
            if cancel_at == Some(index) {
                machine.transition(TaskEvent::Cancel).unwrap();
                cancelled = true;
                break;
            }
            match step {
                StepScript::Skipped => {
                    machine
                        .finish_step(index, StepEvent::fail_with_error(
                            dispatch_core::orchestration::StepFailureKind::Timeout,
                            "execution budget exhausted",
                        ))
                        .unwrap();
                }
                StepScript::Succeeds => {
                    machine.start_step(index).unwrap();
                    prop_assert!(machine.snapshot().has_ordered_step_statuses());
                    machine.finish_step(index, StepEvent::Complete("ok".to_string())).unwrap();
                }
                StepScript::Fails(kind) => {
                    machine.start_step(index).unwrap();
                    prop_assert!(machine.snapshot().has_ordered_step_statuses());
                    machine
                        .finish_step(index, StepEvent::fail_with_error(*kind, "peer failed"))
                        .unwrap();
                }
            }
            prop_assert!(machine.snapshot().has_ordered_step_statuses());
        }

        if !cancelled {
            let completed = machine.task().completed_count();
            let state = machine
                .transition(TaskEvent::from_tally(completed, script.len()))
                .unwrap();
            let expected = if completed == script.len() {
                TaskState::Completed
            } else if completed > 0 {
                TaskState::PartiallyFailed
            } else {
                TaskState::Failed
            };
            prop_assert_eq!(state, expected);
        }

        let snapshot = machine.snapshot();
        prop_assert!(snapshot.status.is_terminal());
        prop_assert!(snapshot.has_ordered_step_statuses());
        prop_assert!(machine.transition(TaskEvent::Start).is_err());
    }

    /// Property: a Working step followed by anything but Pending breaks the ordering
    #[test]
    fn working_step_must_precede_only_pending(
        prefix in prop::collection::vec(
            prop_oneof![Just(StepState::Completed), Just(StepState::Failed)],
            0..5,
        ),
        after in step_state_strategy(),
    ) {
        let mut statuses = prefix;
        statuses.push(StepState::Working);
        statuses.push(after);
        prop_assert_eq!(step_statuses_are_ordered(statuses), after == StepState::Pending);
    }

    /// Property: steps never start out of order
    #[test]
    fn later_step_cannot_start_first(len in 2usize..8, target in 1usize..8) {
        prop_assume!(target < len);
        let (task, steps) = planned_task(len);
        let mut machine = TaskStateMachine::new(task);
        machine.install_plan(steps).unwrap();
        machine.transition(TaskEvent::Start).unwrap();

        prop_assert!(machine.start_step(target).is_err());
        prop_assert_eq!(machine.task().steps()[target].status, StepState::Pending);
    }
}
