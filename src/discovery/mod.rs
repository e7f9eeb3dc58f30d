//! # Peer Discovery
//!
//! Turns a candidate list into live descriptors. Each candidate settles with exactly one
//! [`ResolutionOutcome`]; failures are typed and non-fatal.

pub mod card_resolver;
pub mod peer_directory;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::PeerDescriptor;

pub use card_resolver::{parse_card, CardResolver, HttpCardResolver};
pub use peer_directory::PeerDirectory;

/// Why a candidate could not be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionFailure {
    #[error("timeout: {detail}")]
    Timeout { detail: String },

    #[error("unreachable: {detail}")]
    Unreachable { detail: String },

    #[error("malformed response: {detail}")]
    MalformedResponse { detail: String },
}

impl ResolutionFailure {
    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::Timeout {
            detail: detail.into(),
        }
    }

    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self::Unreachable {
            detail: detail.into(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Unreachable { .. } => "unreachable",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }
}

/// Result of resolving one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    pub address: String,
    pub result: Result<PeerDescriptor, ResolutionFailure>,
    /// Time from the start of the batch until this candidate settled
    pub elapsed: Duration,
}

impl ResolutionOutcome {
    pub fn is_resolved(&self) -> bool {
        self.result.is_ok()
    }
}

/// All outcomes of one directory query, in candidate order
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionReport {
    outcomes: Vec<ResolutionOutcome>,
    elapsed: Duration,
}

impl ResolutionReport {
    pub fn new(outcomes: Vec<ResolutionOutcome>, elapsed: Duration) -> Self {
        Self { outcomes, elapsed }
    }

    pub fn outcomes(&self) -> &[ResolutionOutcome] {
        &self.outcomes
    }

    /// Usable peers in candidate (discovery) order
    pub fn descriptors(&self) -> Vec<PeerDescriptor> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok().cloned())
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ResolutionFailure)> + '_ {
        self.outcomes.iter().filter_map(|outcome| {
            outcome
                .result
                .as_ref()
                .err()
                .map(|failure| (outcome.address.as_str(), failure))
        })
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_resolved()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.len() - self.resolved_count()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
