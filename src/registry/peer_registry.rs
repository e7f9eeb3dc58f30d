//! # Peer Registration Store Clients
//!
//! Read side of the peer registration store. The directory only needs
//! `list_registered_peers`; registration and removal belong to the store itself.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::paths;
use crate::models::RegisteredPeer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid registry URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Registry at {url} is unavailable: {reason}")]
    Unavailable { url: String, reason: String },

    #[error("Registry at {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Registry at {url} returned an invalid response: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Candidate source for peer discovery
#[async_trait]
pub trait PeerRegistry: Send + Sync {
    async fn list_registered_peers(&self) -> Result<Vec<RegisteredPeer>, RegistryError>;

    /// Short label used in logs
    fn describe(&self) -> String;
}

#[derive(Debug, Deserialize)]
struct AgentsListResponse {
    #[serde(default)]
    agents: Vec<RegisteredPeer>,
}

/// Registry client issuing `GET {registry_url}/agents`
#[derive(Debug, Clone)]
pub struct HttpPeerRegistry {
    client: Client,
    agents_url: Url,
}

impl HttpPeerRegistry {
    pub fn new(registry_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let base = registry_url.trim().trim_end_matches('/');
        let agents_url = Url::parse(&format!("{base}{}", paths::REGISTRY_AGENTS)).map_err(|e| {
            RegistryError::InvalidUrl {
                url: registry_url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::Client(e.to_string()))?;

        Ok(Self { client, agents_url })
    }

    pub fn agents_url(&self) -> &Url {
        &self.agents_url
    }
}

#[async_trait]
impl PeerRegistry for HttpPeerRegistry {
    async fn list_registered_peers(&self) -> Result<Vec<RegisteredPeer>, RegistryError> {
        let url = self.agents_url.to_string();
        debug!(url = %url, "Fetching registered peers");

        let response = self
            .client
            .get(self.agents_url.clone())
            .send()
            .await
            .map_err(|e| RegistryError::Unavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .json::<AgentsListResponse>()
            .await
            .map_err(|e| RegistryError::InvalidResponse {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        debug!(url = %url, count = body.agents.len(), "Fetched registered peers");
        Ok(body.agents)
    }

    fn describe(&self) -> String {
        format!("http registry {}", self.agents_url)
    }
}

/// Fixed address list, typically from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticPeerRegistry {
    addresses: Vec<String>,
}

impl StaticPeerRegistry {
    /// Each entry may itself be a comma-separated list
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = entries
            .into_iter()
            .flat_map(|entry| {
                entry
                    .as_ref()
                    .split(',')
                    .map(str::trim)
                    .filter(|address| !address.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { addresses }
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }
}

#[async_trait]
impl PeerRegistry for StaticPeerRegistry {
    async fn list_registered_peers(&self) -> Result<Vec<RegisteredPeer>, RegistryError> {
        Ok(self
            .addresses
            .iter()
            .map(RegisteredPeer::from_address)
            .collect())
    }

    fn describe(&self) -> String {
        format!("static list of {} peers", self.addresses.len())
    }
}

/// Primary registry with a fallback used when the primary errors or is empty
#[derive(Clone)]
pub struct FallbackPeerRegistry {
    primary: Arc<dyn PeerRegistry>,
    fallback: Arc<dyn PeerRegistry>,
}

impl FallbackPeerRegistry {
    pub fn new(primary: Arc<dyn PeerRegistry>, fallback: Arc<dyn PeerRegistry>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PeerRegistry for FallbackPeerRegistry {
    async fn list_registered_peers(&self) -> Result<Vec<RegisteredPeer>, RegistryError> {
        match self.primary.list_registered_peers().await {
            Ok(peers) if !peers.is_empty() => Ok(peers),
            Ok(_) => {
                warn!(
                    primary = %self.primary.describe(),
                    fallback = %self.fallback.describe(),
                    "Primary registry returned no peers, using fallback"
                );
                self.fallback.list_registered_peers().await
            }
            Err(e) => {
                warn!(
                    primary = %self.primary.describe(),
                    fallback = %self.fallback.describe(),
                    error = %e,
                    "Primary registry failed, using fallback"
                );
                self.fallback.list_registered_peers().await
            }
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} (fallback: {})",
            self.primary.describe(),
            self.fallback.describe()
        )
    }
}
