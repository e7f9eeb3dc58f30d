use std::sync::Arc;
use std::time::Duration;

use dispatch_core::config::DispatchConfig;
use dispatch_core::registry::{
    registry_from_config, FallbackPeerRegistry, HttpPeerRegistry, PeerRegistry, PeerSnapshot,
    RegistryError, StaticPeerRegistry,
};

use crate::common::FakeRegistry;

#[tokio::test]
async fn test_http_registry_lists_registered_peers() {
    let registry_server =
        FakeRegistry::start(["http://127.0.0.1:8011", "http://127.0.0.1:8012"]).await;
    let registry = HttpPeerRegistry::new(&registry_server.url, Duration::from_secs(2))
        .expect("valid registry url");

    let peers = registry
        .list_registered_peers()
        .await
        .expect("registry should answer");

    assert_eq!(peers.len(), 2);
    assert_eq!(peers[0].address, "http://127.0.0.1:8011");
    assert!(peers[0].agent_card.is_none());
    assert!(peers[0].registered_at.is_some());
}

#[tokio::test]
async fn test_snapshot_normalizes_and_excludes_own_address() {
    let registry_server = FakeRegistry::start([
        "http://127.0.0.1:8011/",
        " http://127.0.0.1:8012 ",
        "http://127.0.0.1:8011",
        "http://127.0.0.1:8000",
        "   ",
    ])
    .await;
    let registry = HttpPeerRegistry::new(&registry_server.url, Duration::from_secs(2))
        .expect("valid registry url");

    let snapshot = PeerSnapshot::capture(&registry, Some("http://127.0.0.1:8000/"))
        .await
        .expect("registry should answer");

    assert_eq!(
        snapshot.addresses(),
        vec!["http://127.0.0.1:8011", "http://127.0.0.1:8012"]
    );
}

#[tokio::test]
async fn test_snapshot_is_unaffected_by_later_registrations() {
    let registry_server = FakeRegistry::start(["http://127.0.0.1:8011"]).await;
    let registry = HttpPeerRegistry::new(&registry_server.url, Duration::from_secs(2))
        .expect("valid registry url");

    let snapshot = PeerSnapshot::capture(&registry, None)
        .await
        .expect("registry should answer");
    registry_server.register("http://127.0.0.1:8012");
    let later = PeerSnapshot::capture(&registry, None)
        .await
        .expect("registry should answer");

    assert_eq!(snapshot.len(), 1);
    assert_eq!(later.len(), 2);
}

#[tokio::test]
async fn test_failing_registry_reports_http_status() {
    let registry_server = FakeRegistry::start(["http://127.0.0.1:8011"]).await;
    registry_server.fail();
    let registry = HttpPeerRegistry::new(&registry_server.url, Duration::from_secs(2))
        .expect("valid registry url");

    let result = registry.list_registered_peers().await;

    assert!(matches!(
        result,
        Err(RegistryError::HttpStatus { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_fallback_registry_covers_failing_primary() {
    let registry_server = FakeRegistry::start(["http://127.0.0.1:8011"]).await;
    registry_server.fail();
    let primary: Arc<dyn PeerRegistry> = Arc::new(
        HttpPeerRegistry::new(&registry_server.url, Duration::from_secs(2))
            .expect("valid registry url"),
    );
    let fallback: Arc<dyn PeerRegistry> =
        Arc::new(StaticPeerRegistry::new(["http://127.0.0.1:9001,http://127.0.0.1:9002"]));

    let peers = FallbackPeerRegistry::new(primary, fallback)
        .list_registered_peers()
        .await
        .expect("fallback should answer");

    let addresses: Vec<String> = peers.into_iter().map(|p| p.address).collect();
    assert_eq!(addresses, vec!["http://127.0.0.1:9001", "http://127.0.0.1:9002"]);
}

#[tokio::test]
async fn test_registry_from_config_reads_http_registry() {
    let registry_server = FakeRegistry::start(["http://127.0.0.1:8011"]).await;
    let mut config = DispatchConfig::default();
    config.discovery.registry_url = Some(registry_server.url.clone());

    let registry = registry_from_config(&config).expect("registry should build");
    let snapshot = PeerSnapshot::capture(registry.as_ref(), None)
        .await
        .expect("registry should answer");

    assert_eq!(snapshot.addresses(), vec!["http://127.0.0.1:8011"]);
}
