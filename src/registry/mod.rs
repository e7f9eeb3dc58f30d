//! # Peer Registry
//!
//! Candidate sources for peer discovery.
//!
//! ## Available Registries
//!
//! - **HttpPeerRegistry**: reads `GET {registry_url}/agents` from the registration store
//! - **StaticPeerRegistry**: fixed address list from configuration
//! - **FallbackPeerRegistry**: primary registry with a fallback when it fails or is empty
//!
//! ## Architecture
//!
//! ```text
//! PeerRegistry (trait)
//! ├── HttpPeerRegistry
//! ├── StaticPeerRegistry
//! └── FallbackPeerRegistry  (primary + fallback)
//!         │
//!         ▼
//! PeerSnapshot (captured once per request, passed into the run)
//! ```

pub mod peer_registry;
pub mod snapshot;

use std::sync::Arc;

use crate::config::DispatchConfig;

pub use peer_registry::{
    FallbackPeerRegistry, HttpPeerRegistry, PeerRegistry, RegistryError, StaticPeerRegistry,
};
pub use snapshot::{normalize_address, PeerSnapshot};

/// Build the registry stack described by the discovery configuration.
///
/// Registry URL and static peers together produce a fallback registry; either alone is
/// used directly; neither yields an empty static list.
pub fn registry_from_config(
    config: &DispatchConfig,
) -> Result<Arc<dyn PeerRegistry>, RegistryError> {
    let discovery = &config.discovery;
    let registry_url = discovery
        .registry_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());
    let static_registry = StaticPeerRegistry::new(&discovery.static_peers);

    let registry: Arc<dyn PeerRegistry> = match registry_url {
        Some(url) => {
            let http: Arc<dyn PeerRegistry> =
                Arc::new(HttpPeerRegistry::new(url, config.overall_budget())?);
            if static_registry.addresses().is_empty() {
                http
            } else {
                Arc::new(FallbackPeerRegistry::new(http, Arc::new(static_registry)))
            }
        }
        None => Arc::new(static_registry),
    };

    Ok(registry)
}
