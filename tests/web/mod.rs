//! Test server and SSE helpers for the web API tests

mod health_and_peers;
mod task_endpoints;

use reqwest::Response;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use dispatch_core::config::DispatchConfig;
use dispatch_core::events::EmittedEvent;
use dispatch_core::web::{self, AppState};

use crate::common::{http_client, test_config};

/// Dispatch server on a loopback port; shut down gracefully on drop
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(config: DispatchConfig) -> Self {
        let state =
            AppState::from_config(config, "test", http_client()).expect("valid test config");
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let base_url = format!(
            "http://{}",
            listener.local_addr().expect("Test server has no local address")
        );

        let (tx, rx) = oneshot::channel::<()>();
        let serve_state = state.clone();
        let handle = tokio::spawn(async move {
            let _ = web::serve(listener, serve_state, async move {
                let _ = rx.await;
            })
            .await;
        });

        Self {
            base_url,
            state,
            shutdown: Some(tx),
            handle,
        }
    }

    /// Server reading peers from the fake registry at `registry_url`
    pub async fn with_registry(registry_url: &str) -> Self {
        let mut config = test_config();
        config.discovery.registry_url = Some(registry_url.to_string());
        Self::start(config).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn dispatch(&self, body: serde_json::Value) -> Response {
        http_client()
            .post(self.url("/v1/dispatch"))
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .expect("dispatch request failed")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

/// One parsed server-sent event frame
#[derive(Debug, Clone)]
pub struct SseFrame {
    pub event: String,
    pub id: String,
    pub data: EmittedEvent,
}

/// Parse every data-carrying frame in an SSE body; keep-alive comments are skipped
pub fn parse_sse(body: &str) -> Vec<SseFrame> {
    body.replace("\r\n", "\n")
        .split("\n\n")
        .filter_map(|block| {
            let mut event = None;
            let mut id = None;
            let mut data = Vec::new();
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    event = Some(value.trim().to_string());
                } else if let Some(value) = line.strip_prefix("id:") {
                    id = Some(value.trim().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
                }
            }
            if data.is_empty() {
                return None;
            }
            let data: EmittedEvent =
                serde_json::from_str(&data.join("\n")).expect("frame data is an emitted event");
            Some(SseFrame {
                event: event.unwrap_or_else(|| "message".to_string()),
                id: id.unwrap_or_default(),
                data,
            })
        })
        .collect()
}
