//! # Peer Models
//!
//! `AgentCard` is the wire form a peer publishes about itself; `PeerDescriptor` is the
//! immutable record the directory produces from it. Descriptors are never cached: every
//! orchestrator run resolves its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agent card as served at a peer's well-known path or embedded in a registry entry.
///
/// Unknown fields are ignored so cards from newer peers still resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSkill {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A named capability a peer declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSkill {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl From<&AgentSkill> for PeerSkill {
    fn from(skill: &AgentSkill) -> Self {
        Self {
            name: skill.name.clone(),
            description: skill.description.clone(),
            tags: skill.tags.clone(),
        }
    }
}

/// Resolved identity and capabilities of a live peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerDescriptor {
    pub name: String,
    /// Candidate address the descriptor was resolved from
    pub address: String,
    /// Where messages are sent: the card's `url`, else `address`
    pub endpoint: String,
    pub version: Option<String>,
    pub description: String,
    pub skills: Vec<PeerSkill>,
    pub resolved_at: DateTime<Utc>,
}

impl PeerDescriptor {
    pub fn from_card(address: &str, card: &AgentCard, resolved_at: DateTime<Utc>) -> Self {
        let endpoint = card
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(address)
            .to_string();

        Self {
            name: card.name.clone(),
            address: address.to_string(),
            endpoint,
            version: card.version.clone(),
            description: card.description.clone(),
            skills: card.skills.iter().map(PeerSkill::from).collect(),
            resolved_at,
        }
    }

    /// Lower-cased text the planner matches capability keywords against
    pub fn capability_text(&self) -> String {
        let mut parts = vec![self.name.as_str(), self.description.as_str()];
        for skill in &self.skills {
            parts.push(&skill.name);
            parts.push(&skill.description);
            parts.extend(skill.tags.iter().map(String::as_str));
        }
        parts.join(" ").to_lowercase()
    }

    /// Same identity and capabilities, ignoring when it was resolved
    pub fn same_peer(&self, other: &Self) -> bool {
        self.name == other.name
            && self.address == other.address
            && self.endpoint == other.endpoint
            && self.version == other.version
            && self.description == other.description
            && self.skills == other.skills
    }

    pub fn to_ref(&self) -> PeerRef {
        PeerRef {
            name: self.name.clone(),
            address: self.address.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

/// Reference from a step to the already-resolved peer it targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRef {
    pub name: String,
    pub address: String,
    pub endpoint: String,
}

/// Entry returned by the peer registration store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredPeer {
    pub address: String,
    #[serde(default)]
    pub agent_card: Option<AgentCard>,
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
}

impl RegisteredPeer {
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            agent_card: None,
            registered_at: None,
        }
    }
}
