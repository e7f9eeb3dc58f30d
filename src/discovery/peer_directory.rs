//! # Peer Directory
//!
//! Resolves candidate addresses into descriptors with one concurrent call per candidate.
//!
//! Every call gets the same deadline, `min(start + per_call_timeout, start +
//! overall_budget)`, so total latency is bounded by the slowest surviving call or the
//! deadline, never by the number of candidates. A call that misses the deadline yields
//! `Timeout` for that candidate only; siblings are unaffected. Failed candidates are
//! logged and dropped from the usable set, never surfaced as a fatal error.

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::card_resolver::CardResolver;
use super::{ResolutionFailure, ResolutionOutcome, ResolutionReport};
use crate::constants::events;
use crate::logging::log_discovery_operation;
use crate::models::PeerDescriptor;
use crate::registry::PeerSnapshot;

#[derive(Clone)]
pub struct PeerDirectory {
    resolver: Arc<dyn CardResolver>,
}

impl PeerDirectory {
    pub fn new(resolver: Arc<dyn CardResolver>) -> Self {
        Self { resolver }
    }

    /// Resolve every candidate in the snapshot
    pub async fn resolve_snapshot(
        &self,
        snapshot: &PeerSnapshot,
        per_call_timeout: Duration,
        overall_budget: Duration,
    ) -> ResolutionReport {
        self.resolve(&snapshot.addresses(), per_call_timeout, overall_budget)
            .await
    }

    /// Resolve each address concurrently; one outcome per address, in input order
    #[instrument(skip(self, addresses), fields(candidates = addresses.len()))]
    pub async fn resolve(
        &self,
        addresses: &[String],
        per_call_timeout: Duration,
        overall_budget: Duration,
    ) -> ResolutionReport {
        let start = Instant::now();
        let deadline = start + per_call_timeout.min(overall_budget);

        debug!(
            event = events::DISCOVERY_STARTED,
            per_call_timeout_ms = per_call_timeout.as_millis() as u64,
            overall_budget_ms = overall_budget.as_millis() as u64,
            "Resolving peer candidates"
        );

        let calls = addresses.iter().map(|address| {
            let resolver = Arc::clone(&self.resolver);
            async move {
                let result =
                    match tokio::time::timeout_at(deadline, resolver.fetch_card(address)).await {
                        Ok(Ok(card)) => Ok(PeerDescriptor::from_card(address, &card, Utc::now())),
                        Ok(Err(failure)) => Err(failure),
                        Err(_) => Err(ResolutionFailure::timeout(format!(
                            "no card from {address} within {}ms",
                            deadline.duration_since(start).as_millis()
                        ))),
                    };

                ResolutionOutcome {
                    address: address.clone(),
                    result,
                    elapsed: start.elapsed(),
                }
            }
        });

        let outcomes = join_all(calls).await;

        for outcome in &outcomes {
            if let Err(failure) = &outcome.result {
                warn!(
                    event = events::DISCOVERY_CANDIDATE_DROPPED,
                    address = %outcome.address,
                    failure = failure.kind(),
                    detail = %failure,
                    "Dropping unresolvable peer candidate"
                );
            }
        }

        let report = ResolutionReport::new(outcomes, start.elapsed());
        log_discovery_operation(
            events::DISCOVERY_COMPLETED,
            None,
            "settled",
            Some(report.elapsed().as_millis() as u64),
            Some(
                format!(
                    "{} of {} candidates resolved",
                    report.resolved_count(),
                    report.len()
                )
                .as_str(),
            ),
        );

        report
    }
}
