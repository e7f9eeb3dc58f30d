use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::peer_registry::{PeerRegistry, RegistryError};
use crate::models::RegisteredPeer;

/// Immutable candidate list captured once per request.
///
/// Passed explicitly into each orchestrator run so runs never observe registry changes
/// mid-flight and never share mutable peer state.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerSnapshot {
    candidates: Vec<RegisteredPeer>,
    taken_at: DateTime<Utc>,
}

impl PeerSnapshot {
    /// Read the registry once and normalize the result
    pub async fn capture(
        registry: &dyn PeerRegistry,
        self_address: Option<&str>,
    ) -> Result<Self, RegistryError> {
        let peers = registry.list_registered_peers().await?;
        Ok(Self::from_registered(peers, self_address))
    }

    /// Normalize addresses: trimmed, no trailing slash, blanks and duplicates dropped
    /// (first occurrence wins), own address excluded
    pub fn from_registered(peers: Vec<RegisteredPeer>, self_address: Option<&str>) -> Self {
        let own = self_address.and_then(normalize_address);
        let mut seen = HashSet::new();

        let candidates = peers
            .into_iter()
            .filter_map(|mut peer| {
                let address = normalize_address(&peer.address)?;
                if own.as_deref() == Some(address.as_str()) || !seen.insert(address.clone()) {
                    return None;
                }
                peer.address = address;
                Some(peer)
            })
            .collect();

        Self {
            candidates,
            taken_at: Utc::now(),
        }
    }

    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_registered(
            addresses
                .into_iter()
                .map(RegisteredPeer::from_address)
                .collect(),
            None,
        )
    }

    pub fn empty() -> Self {
        Self::from_registered(Vec::new(), None)
    }

    pub fn candidates(&self) -> &[RegisteredPeer] {
        &self.candidates
    }

    pub fn addresses(&self) -> Vec<String> {
        self.candidates.iter().map(|p| p.address.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }
}

/// Trim whitespace and trailing slashes; `None` for blank input
pub fn normalize_address(address: &str) -> Option<String> {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
