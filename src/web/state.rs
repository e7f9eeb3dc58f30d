//! # Web API Application State
//!
//! Shared state handed to every handler: configuration, the peer registry, the
//! orchestrator and the task store. Holds no per-request state; each dispatch run owns
//! its own task.

use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::orchestration::DispatchOrchestrator;
use crate::persistence::{InMemoryTaskStore, TaskStore};
use crate::registry::{registry_from_config, PeerRegistry, PeerSnapshot, RegistryError};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DispatchConfig>,
    pub environment: String,
    pub registry: Arc<dyn PeerRegistry>,
    pub orchestrator: Arc<DispatchOrchestrator>,
    pub store: Arc<dyn TaskStore>,
}

impl AppState {
    pub fn new(
        config: Arc<DispatchConfig>,
        environment: impl Into<String>,
        registry: Arc<dyn PeerRegistry>,
        orchestrator: Arc<DispatchOrchestrator>,
        store: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            config,
            environment: environment.into(),
            registry,
            orchestrator,
            store,
        }
    }

    /// Wire the HTTP registry client, card resolver, transport and in-memory store
    pub fn from_config(
        config: DispatchConfig,
        environment: impl Into<String>,
        client: Client,
    ) -> Result<Self, DispatchError> {
        config.validate()?;
        let config = Arc::new(config);
        let registry = registry_from_config(&config)?;
        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new(
            config.persistence.recent_task_limit,
        ));
        let orchestrator = Arc::new(
            DispatchOrchestrator::from_config(Arc::clone(&config), client)
                .with_store(Arc::clone(&store)),
        );

        info!(registry = %registry.describe(), "Application state initialized");
        Ok(Self::new(config, environment, registry, orchestrator, store))
    }

    /// Read the registry once for a request
    pub async fn try_capture_snapshot(&self) -> Result<PeerSnapshot, RegistryError> {
        PeerSnapshot::capture(
            self.registry.as_ref(),
            self.config.discovery.self_address.as_deref(),
        )
        .await
    }

    /// Like [`try_capture_snapshot`](Self::try_capture_snapshot), but an unavailable
    /// registry yields an empty snapshot so the run ends with `NoPeersAvailable`
    pub async fn capture_snapshot(&self) -> PeerSnapshot {
        match self.try_capture_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(
                    registry = %self.registry.describe(),
                    error = %error,
                    "Peer registry unavailable, continuing with no candidates"
                );
                PeerSnapshot::empty()
            }
        }
    }
}
