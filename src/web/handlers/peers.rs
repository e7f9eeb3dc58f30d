//! # Peer Listing Handler

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::discovery::ResolutionFailure;
use crate::models::PeerDescriptor;
use crate::web::errors::ApiResult;
use crate::web::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct PeerFailure {
    pub address: String,
    pub failure: ResolutionFailure,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PeersResponse {
    pub candidates: usize,
    pub peers: Vec<PeerDescriptor>,
    pub failures: Vec<PeerFailure>,
    pub elapsed_ms: u64,
}

/// Resolve the current registry snapshot: GET /v1/peers
pub async fn list_peers(State(state): State<AppState>) -> ApiResult<Json<PeersResponse>> {
    let snapshot = state.try_capture_snapshot().await?;
    let report = state
        .orchestrator
        .directory()
        .resolve_snapshot(
            &snapshot,
            state.config.per_call_timeout(),
            state.config.overall_budget(),
        )
        .await;

    Ok(Json(PeersResponse {
        candidates: report.len(),
        peers: report.descriptors(),
        failures: report
            .failures()
            .map(|(address, failure)| PeerFailure {
                address: address.to_string(),
                failure: failure.clone(),
            })
            .collect(),
        elapsed_ms: report.elapsed().as_millis() as u64,
    }))
}
