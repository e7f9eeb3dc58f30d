use dispatch_core::events::{EventEmitter, ProgressEvent};
use dispatch_core::models::DispatchRequest;
use dispatch_core::registry::PeerSnapshot;
use dispatch_core::state_machine::{StepState, TaskState};
use tokio_util::sync::CancellationToken;

use crate::common::{millis, orchestrator, terminal_events, test_config, FakePeer, FakePeerSpec};

#[tokio::test]
async fn test_cancel_mid_step_stops_before_next_peer() {
    let fire = FakePeer::start(FakePeerSpec::fire().with_reply_delay(millis(300))).await;
    let police = FakePeer::start(FakePeerSpec::police()).await;
    let snapshot = PeerSnapshot::from_addresses([fire.address.clone(), police.address.clone()]);
    let orchestrator = orchestrator(test_config());

    let cancel = CancellationToken::new();
    let (emitter, mut receiver) = EventEmitter::channel(64, cancel.clone());
    let canceller = cancel.clone();
    let mut events = Vec::new();

    let run = orchestrator.run(
        DispatchRequest::new("Fire near the bank, police needed"),
        &snapshot,
        emitter,
        cancel,
    );
    let watch = async {
        while let Some(event) = receiver.recv().await {
            // Cancel as soon as the first dispatch is announced
            if matches!(&event.event, ProgressEvent::Status { state: TaskState::Working, .. }) {
                canceller.cancel();
            }
            events.push(event);
        }
    };
    let (task, ()) = tokio::join!(run, watch);

    assert_eq!(task.status, TaskState::Cancelled);
    assert_eq!(task.steps[0].status, StepState::Completed);
    assert_eq!(task.steps[1].status, StepState::Pending);
    assert!(police.received().is_empty());

    // The in-flight outcome is recorded but not streamed
    assert!(events.iter().all(|e| e.event.step_id().is_none()));
    let terminals = terminal_events(&events);
    assert_eq!(terminals.len(), 1);
    assert!(matches!(
        &terminals[0].event,
        ProgressEvent::Status { state: TaskState::Cancelled, message: Some(m), .. }
            if m == "Dispatch cancelled after 1 of 2 steps"
    ));
}

#[tokio::test]
async fn test_cancel_before_run_contacts_no_peer() {
    let fire = FakePeer::start(FakePeerSpec::fire()).await;
    let snapshot = PeerSnapshot::from_addresses([fire.address.clone()]);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let (emitter, mut receiver) = EventEmitter::channel(64, cancel.clone());

    let task = orchestrator(test_config())
        .run(DispatchRequest::new("Fire!"), &snapshot, emitter, cancel)
        .await;

    assert_eq!(task.status, TaskState::Cancelled);
    assert!(fire.received().is_empty());

    let mut last = None;
    while let Some(event) = receiver.recv().await {
        last = Some(event);
    }
    assert!(last.expect("terminal event emitted").event.is_terminal());
}

#[tokio::test]
async fn test_dropped_receiver_cancels_the_run() {
    let fire = FakePeer::start(FakePeerSpec::fire()).await;
    let police = FakePeer::start(FakePeerSpec::police()).await;
    let snapshot = PeerSnapshot::from_addresses([fire.address.clone(), police.address.clone()]);

    let cancel = CancellationToken::new();
    let (emitter, receiver) = EventEmitter::channel(64, cancel.clone());
    drop(receiver);

    let task = orchestrator(test_config())
        .run(
            DispatchRequest::new("Fire and theft downtown"),
            &snapshot,
            emitter,
            cancel.clone(),
        )
        .await;

    assert!(cancel.is_cancelled());
    assert_eq!(task.status, TaskState::Cancelled);
    assert!(fire.received().is_empty());
    assert!(police.received().is_empty());
}
