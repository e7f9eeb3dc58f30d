use reqwest::StatusCode;
use serde_json::{json, Value};

use dispatch_core::models::TaskSnapshot;
use dispatch_core::state_machine::{StepState, TaskState};

use super::{parse_sse, TestServer};
use crate::common::{http_client, FakePeer, FakePeerSpec, FakeRegistry};

async fn run_dispatch(server: &TestServer, text: &str) -> String {
    let frames = parse_sse(
        &server
            .dispatch(json!({ "text": text }))
            .await
            .text()
            .await
            .expect("stream body"),
    );
    frames
        .last()
        .expect("frames")
        .data
        .event
        .task_id()
        .to_string()
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let server = TestServer::start(crate::common::test_config()).await;

    let response = http_client()
        .get(server.url("/v1/tasks/does-not-exist"))
        .send()
        .await
        .expect("request sent");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("json error body");
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("does-not-exist"));
}

#[tokio::test]
async fn test_finished_task_can_be_fetched() {
    let fire = FakePeer::start(FakePeerSpec::fire()).await;
    let registry = FakeRegistry::start([fire.address.clone()]).await;
    let server = TestServer::with_registry(&registry.url).await;

    let task_id = run_dispatch(&server, "Chimney fire on Oak Street").await;

    let response = http_client()
        .get(server.url(&format!("/v1/tasks/{task_id}")))
        .send()
        .await
        .expect("request sent");
    assert_eq!(response.status(), StatusCode::OK);

    let task: TaskSnapshot = response.json().await.expect("task snapshot");
    assert_eq!(task.task_id, task_id);
    assert_eq!(task.status, TaskState::Completed);
    assert_eq!(task.steps.len(), 1);
    assert_eq!(task.steps[0].status, StepState::Completed);
    assert_eq!(task.steps[0].target.name, "Fire Brigade");
    assert!(task.has_ordered_step_statuses());
}

#[tokio::test]
async fn test_recent_tasks_are_listed_newest_first() {
    let fire = FakePeer::start(FakePeerSpec::fire()).await;
    let registry = FakeRegistry::start([fire.address.clone()]).await;
    let server = TestServer::with_registry(&registry.url).await;

    let first = run_dispatch(&server, "Fire in the basement").await;
    let second = run_dispatch(&server, "Fire in the attic").await;

    let all: Value = http_client()
        .get(server.url("/v1/tasks"))
        .send()
        .await
        .expect("request sent")
        .json()
        .await
        .expect("task list");
    let ids: Vec<&str> = all["tasks"]
        .as_array()
        .expect("tasks array")
        .iter()
        .filter_map(|t| t["task_id"].as_str())
        .collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);

    let limited: Value = http_client()
        .get(server.url("/v1/tasks?limit=1"))
        .send()
        .await
        .expect("request sent")
        .json()
        .await
        .expect("task list");
    assert_eq!(limited["tasks"].as_array().map(Vec::len), Some(1));
}
