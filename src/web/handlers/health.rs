//! # Health Check Handlers

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::web::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub environment: String,
    pub registry: String,
}

/// Basic health check endpoint: GET /health
pub async fn basic_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: state.environment.clone(),
        registry: state.registry.describe(),
    })
}
