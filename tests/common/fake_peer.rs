//! Fake A2A peer: serves an agent card and answers JSON-RPC `message/send`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use dispatch_core::constants::paths;

/// How the peer publishes its card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardMode {
    Current,
    /// 404 at the current path, card at the legacy path
    LegacyOnly,
    /// 200 with a body that is not a card
    Malformed,
}

/// How the peer answers `message/send`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMode {
    Message(String),
    Task(String),
    RpcError { code: i64, message: String },
    HttpStatus(u16),
    Garbage,
}

#[derive(Debug, Clone)]
pub struct FakePeerSpec {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub card: CardMode,
    pub card_delay: Duration,
    pub reply: ReplyMode,
    pub reply_delay: Duration,
}

impl FakePeerSpec {
    pub fn new(name: &str, description: &str, tags: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            card: CardMode::Current,
            card_delay: Duration::ZERO,
            reply: ReplyMode::Message(format!("{name} acknowledged")),
            reply_delay: Duration::ZERO,
        }
    }

    pub fn fire() -> Self {
        Self::new(
            "Fire Brigade",
            "Firefighting and rescue",
            &["fire", "rescue"],
        )
    }

    pub fn ambulance() -> Self {
        Self::new(
            "Ambulance Service",
            "Emergency medical response",
            &["ambulance", "paramedic"],
        )
    }

    pub fn police() -> Self {
        Self::new(
            "Police Department",
            "Law enforcement and crime investigation",
            &["police"],
        )
    }

    pub fn with_card(mut self, card: CardMode) -> Self {
        self.card = card;
        self
    }

    pub fn with_card_delay(mut self, delay: Duration) -> Self {
        self.card_delay = delay;
        self
    }

    pub fn with_reply(mut self, reply: ReplyMode) -> Self {
        self.reply = reply;
        self
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    pub fn card_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "version": "1.0.0",
            "skills": [{
                "id": self.name.to_lowercase().replace(' ', "_"),
                "name": self.name,
                "description": self.description,
                "tags": self.tags,
            }],
            "capabilities": {"streaming": false}
        })
    }
}

#[derive(Clone)]
struct PeerState {
    spec: Arc<FakePeerSpec>,
    received: Arc<Mutex<Vec<Value>>>,
}

/// Running fake peer; the server stops when this is dropped
pub struct FakePeer {
    pub address: String,
    pub spec: FakePeerSpec,
    received: Arc<Mutex<Vec<Value>>>,
    handle: JoinHandle<()>,
}

impl FakePeer {
    pub async fn start(spec: FakePeerSpec) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake peer");
        let address = format!(
            "http://{}",
            listener.local_addr().expect("Fake peer has no local address")
        );
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = PeerState {
            spec: Arc::new(spec.clone()),
            received: Arc::clone(&received),
        };

        let app = Router::new()
            .route(paths::AGENT_CARD, get(current_card))
            .route(paths::LEGACY_AGENT_CARD, get(legacy_card))
            .route("/", post(message_send))
            .with_state(state);

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            address,
            spec,
            received,
            handle,
        }
    }

    /// JSON-RPC request bodies received so far
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().expect("poisoned").clone()
    }

    /// Text of the first part of each received message
    pub fn received_texts(&self) -> Vec<String> {
        self.received()
            .iter()
            .filter_map(|body| {
                body["params"]["message"]["parts"][0]["text"]
                    .as_str()
                    .map(str::to_string)
            })
            .collect()
    }
}

impl Drop for FakePeer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Address of a loopback port with nothing listening on it
pub async fn closed_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let address = listener.local_addr().expect("Probe has no local address");
    drop(listener);
    format!("http://{address}")
}

async fn current_card(State(state): State<PeerState>) -> Response {
    tokio::time::sleep(state.spec.card_delay).await;
    match state.spec.card {
        CardMode::Current => Json(state.spec.card_json()).into_response(),
        CardMode::LegacyOnly => StatusCode::NOT_FOUND.into_response(),
        CardMode::Malformed => (StatusCode::OK, "<html>not a card</html>").into_response(),
    }
}

async fn legacy_card(State(state): State<PeerState>) -> Response {
    match state.spec.card {
        CardMode::LegacyOnly => Json(state.spec.card_json()).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn message_send(State(state): State<PeerState>, Json(body): Json<Value>) -> Response {
    let id = body.get("id").cloned().unwrap_or(Value::Null);
    state.received.lock().expect("poisoned").push(body);
    tokio::time::sleep(state.spec.reply_delay).await;

    match &state.spec.reply {
        ReplyMode::Message(text) => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "kind": "message",
                "role": "agent",
                "messageId": "reply-1",
                "parts": [{"kind": "text", "text": text}]
            }
        }))
        .into_response(),
        ReplyMode::Task(text) => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "kind": "task",
                "id": "peer-task-1",
                "status": {
                    "state": "completed",
                    "message": {"role": "agent", "parts": [{"kind": "text", "text": text}]}
                }
            }
        }))
        .into_response(),
        ReplyMode::RpcError { code, message } => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }))
        .into_response(),
        ReplyMode::HttpStatus(status) => StatusCode::from_u16(*status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        ReplyMode::Garbage => (StatusCode::OK, "definitely not json").into_response(),
    }
}
