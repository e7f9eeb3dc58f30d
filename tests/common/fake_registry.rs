//! Fake registration store answering `GET /agents`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use dispatch_core::constants::paths;

#[derive(Clone)]
struct RegistryState {
    addresses: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<bool>>,
}

pub struct FakeRegistry {
    pub url: String,
    state: RegistryState,
    handle: JoinHandle<()>,
}

impl FakeRegistry {
    pub async fn start<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake registry");
        let url = format!(
            "http://{}",
            listener
                .local_addr()
                .expect("Fake registry has no local address")
        );
        let state = RegistryState {
            addresses: Arc::new(Mutex::new(addresses.into_iter().map(Into::into).collect())),
            failing: Arc::new(Mutex::new(false)),
        };

        let app = Router::new()
            .route(paths::REGISTRY_AGENTS, get(list_agents))
            .with_state(state.clone());
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { url, state, handle }
    }

    pub fn register(&self, address: impl Into<String>) {
        self.state
            .addresses
            .lock()
            .expect("poisoned")
            .push(address.into());
    }

    /// Answer 500 from now on
    pub fn fail(&self) {
        *self.state.failing.lock().expect("poisoned") = true;
    }
}

impl Drop for FakeRegistry {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn list_agents(State(state): State<RegistryState>) -> Response {
    if *state.failing.lock().expect("poisoned") {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let agents: Vec<Value> = state
        .addresses
        .lock()
        .expect("poisoned")
        .iter()
        .map(|address| {
            json!({
                "address": address,
                "agent_card": null,
                "registered_at": "2026-10-01T12:00:00Z"
            })
        })
        .collect();
    Json(json!({ "agents": agents })).into_response()
}
