use reqwest::StatusCode;
use serde_json::Value;

use dispatch_core::web::handlers::health::HealthResponse;
use dispatch_core::web::handlers::peers::PeersResponse;

use super::TestServer;
use crate::common::fake_peer::closed_address;
use crate::common::{http_client, FakePeer, FakePeerSpec, FakeRegistry};

#[tokio::test]
async fn test_health_reports_environment_and_registry() {
    let registry = FakeRegistry::start(Vec::<String>::new()).await;
    let server = TestServer::with_registry(&registry.url).await;

    let health: HealthResponse = http_client()
        .get(server.url("/health"))
        .send()
        .await
        .expect("request sent")
        .json()
        .await
        .expect("health body");

    assert_eq!(health.status, "ok");
    assert_eq!(health.environment, "test");
    assert!(health.registry.starts_with("http registry"));
}

#[tokio::test]
async fn test_peers_lists_resolved_and_failed_candidates() {
    let fire = FakePeer::start(FakePeerSpec::fire()).await;
    let dead = closed_address().await;
    let registry = FakeRegistry::start([fire.address.clone(), dead.clone()]).await;
    let server = TestServer::with_registry(&registry.url).await;

    let response = http_client()
        .get(server.url("/v1/peers"))
        .send()
        .await
        .expect("request sent");
    assert_eq!(response.status(), StatusCode::OK);

    let peers: PeersResponse = response.json().await.expect("peers body");
    assert_eq!(peers.candidates, 2);
    assert_eq!(peers.peers.len(), 1);
    assert_eq!(peers.peers[0].name, "Fire Brigade");
    assert_eq!(peers.peers[0].endpoint, fire.address);
    assert_eq!(peers.failures.len(), 1);
    assert_eq!(peers.failures[0].address, dead);
    assert_eq!(peers.failures[0].failure.kind(), "unreachable");
}

#[tokio::test]
async fn test_peers_with_failing_registry_is_unavailable() {
    let registry = FakeRegistry::start(Vec::<String>::new()).await;
    registry.fail();
    let server = TestServer::with_registry(&registry.url).await;

    let response = http_client()
        .get(server.url("/v1/peers"))
        .send()
        .await
        .expect("request sent");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.expect("json error body");
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}
