use dispatch_core::events::ProgressEvent;
use dispatch_core::models::DispatchRequest;
use dispatch_core::orchestration::StepFailureKind;
use dispatch_core::registry::PeerSnapshot;
use dispatch_core::state_machine::{StepState, TaskState};

use crate::common::{
    orchestrator, run_collecting, step_outcome_lines, test_config, FakePeer, FakePeerSpec,
    ReplyMode,
};

async fn single_peer_failure(reply: ReplyMode) -> (StepFailureKind, String) {
    let fire = FakePeer::start(FakePeerSpec::fire().with_reply(reply)).await;
    let snapshot = PeerSnapshot::from_addresses([fire.address.clone()]);

    let (task, _) = run_collecting(
        &orchestrator(test_config()),
        DispatchRequest::new("Warehouse fire"),
        &snapshot,
    )
    .await;

    assert_eq!(task.status, TaskState::Failed);
    let error = task.steps[0].error.clone().expect("step error recorded");
    (error.kind, error.detail)
}

#[tokio::test]
async fn test_json_rpc_error_is_rejected_by_peer() {
    let (kind, detail) = single_peer_failure(ReplyMode::RpcError {
        code: -32602,
        message: "no units available".to_string(),
    })
    .await;

    assert_eq!(kind, StepFailureKind::RejectedByPeer);
    assert!(detail.contains("no units available"));
}

#[tokio::test]
async fn test_http_error_status_is_rejected_by_peer() {
    let (kind, detail) = single_peer_failure(ReplyMode::HttpStatus(503)).await;

    assert_eq!(kind, StepFailureKind::RejectedByPeer);
    assert!(detail.contains("503"));
}

#[tokio::test]
async fn test_non_json_reply_is_malformed() {
    let (kind, _) = single_peer_failure(ReplyMode::Garbage).await;

    assert_eq!(kind, StepFailureKind::MalformedResponse);
}

#[tokio::test]
async fn test_peer_gone_since_last_resolution_drops_out() {
    let fire = FakePeer::start(FakePeerSpec::fire()).await;
    let police = FakePeer::start(FakePeerSpec::police()).await;
    let snapshot = PeerSnapshot::from_addresses([fire.address.clone(), police.address.clone()]);

    let earlier = orchestrator(test_config());
    let report = earlier
        .directory()
        .resolve_snapshot(
            &snapshot,
            earlier.config().per_call_timeout(),
            earlier.config().overall_budget(),
        )
        .await;
    assert_eq!(report.resolved_count(), 2);
    drop(fire);

    let (task, events) = run_collecting(
        &orchestrator(test_config()),
        DispatchRequest::new("Fire and theft at the mall"),
        &snapshot,
    )
    .await;

    // Descriptors are never reused across runs, so the dead peer drops out at discovery
    assert_eq!(task.status, TaskState::Completed);
    assert_eq!(task.steps.len(), 1);
    assert_eq!(task.steps[0].target.name, "Police Department");
    assert!(step_outcome_lines(&events)[0].starts_with("[OK]"));
}

#[tokio::test]
async fn test_failure_does_not_stop_later_steps() {
    let fire = FakePeer::start(FakePeerSpec::fire().with_reply(ReplyMode::Garbage)).await;
    let ambulance = FakePeer::start(FakePeerSpec::ambulance().with_reply(ReplyMode::RpcError {
        code: -32000,
        message: "all crews busy".to_string(),
    }))
    .await;
    let police = FakePeer::start(FakePeerSpec::police()).await;
    let snapshot = PeerSnapshot::from_addresses([
        fire.address.clone(),
        ambulance.address.clone(),
        police.address.clone(),
    ]);

    let (task, events) = run_collecting(
        &orchestrator(test_config()),
        DispatchRequest::new("Fire, injured driver, police needed on Route 9"),
        &snapshot,
    )
    .await;

    assert_eq!(task.status, TaskState::PartiallyFailed);
    let statuses: Vec<StepState> = task.steps.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![StepState::Failed, StepState::Failed, StepState::Completed]
    );
    assert_eq!(police.received().len(), 1);

    let lines = step_outcome_lines(&events);
    assert!(lines[0].starts_with("[FAILED] [1/3]"));
    assert!(lines[1].starts_with("[FAILED] [2/3]"));
    assert!(lines[2].starts_with("[OK] [3/3]"));

    let kinds: Vec<Option<StepFailureKind>> = events
        .iter()
        .filter_map(|e| match &e.event {
            ProgressEvent::Error {
                step_id: Some(_),
                failure,
                ..
            } => Some(*failure),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(StepFailureKind::MalformedResponse),
            Some(StepFailureKind::RejectedByPeer)
        ]
    );
}

#[tokio::test]
async fn test_every_step_failing_fails_the_task() {
    let fire = FakePeer::start(FakePeerSpec::fire().with_reply(ReplyMode::HttpStatus(500))).await;
    let police = FakePeer::start(FakePeerSpec::police().with_reply(ReplyMode::Garbage)).await;
    let snapshot = PeerSnapshot::from_addresses([fire.address.clone(), police.address.clone()]);

    let (task, events) = run_collecting(
        &orchestrator(test_config()),
        DispatchRequest::new("Fire spreading, arrest the arsonist"),
        &snapshot,
    )
    .await;

    assert_eq!(task.status, TaskState::Failed);
    assert_eq!(task.failed_count(), 2);
    assert!(matches!(
        &events.last().expect("events emitted").event,
        ProgressEvent::Status { state: TaskState::Failed, is_final: true, message: Some(m), .. }
            if m == "[FAILED] No peer could be dispatched (0/2)"
    ));
}

#[tokio::test]
async fn test_exhausted_budget_fails_remaining_steps_without_contacting_them() {
    let fire = FakePeer::start(FakePeerSpec::fire().with_reply_delay(
        crate::common::millis(5_000),
    ))
    .await;
    let police = FakePeer::start(FakePeerSpec::police()).await;
    let snapshot = PeerSnapshot::from_addresses([fire.address.clone(), police.address.clone()]);

    let mut config = test_config();
    config.execution.step_timeout_ms = 2_000;
    config.execution.max_task_duration_ms = Some(600);

    let (task, _) = run_collecting(
        &orchestrator(config),
        DispatchRequest::new("Fire and a robbery, police please"),
        &snapshot,
    )
    .await;

    assert_eq!(task.status, TaskState::Failed);
    assert_eq!(task.steps[0].error.as_ref().map(|e| e.kind), Some(StepFailureKind::Timeout));
    let second = task.steps[1].error.as_ref().expect("second step failed");
    assert_eq!(second.kind, StepFailureKind::Timeout);
    assert_eq!(second.detail, "execution budget exhausted");
    assert!(police.received().is_empty());
}
