//! # Peer Message Transport
//!
//! Sends a dispatch message to a peer endpoint and extracts the reply text. The A2A
//! implementation speaks JSON-RPC 2.0 `message/send` over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::types::{PeerReply, StepFailureKind};
use crate::constants::defaults;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Peer unreachable at {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("Peer rejected the message ({code}): {message}")]
    RejectedByPeer { code: i64, message: String },

    #[error("Malformed response from peer: {reason}")]
    MalformedResponse { reason: String },
}

impl TransportError {
    pub fn kind(&self) -> StepFailureKind {
        match self {
            Self::Unreachable { .. } => StepFailureKind::Unreachable,
            Self::Timeout { .. } => StepFailureKind::Timeout,
            Self::RejectedByPeer { .. } => StepFailureKind::RejectedByPeer,
            Self::MalformedResponse { .. } => StepFailureKind::MalformedResponse,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    pub fn rejected(code: i64, message: impl Into<String>) -> Self {
        Self::RejectedByPeer {
            code,
            message: message.into(),
        }
    }
}

/// Peer message endpoint client. Implementations carry no timeout of their own; the
/// step executor bounds every call.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn send_message(
        &self,
        endpoint: &str,
        message: &str,
        context_id: &str,
    ) -> Result<PeerReply, TransportError>;
}

#[derive(Debug, Clone)]
pub struct A2aHttpTransport {
    client: Client,
}

impl A2aHttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PeerTransport for A2aHttpTransport {
    async fn send_message(
        &self,
        endpoint: &str,
        message: &str,
        context_id: &str,
    ) -> Result<PeerReply, TransportError> {
        let body = message_send_request(message, context_id);
        debug!(endpoint = %endpoint, context_id = %context_id, "Sending message/send");

        let response = self
            .client
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_request_error(endpoint, &e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let reason = status.canonical_reason().unwrap_or("HTTP error");
            return Err(TransportError::rejected(
                i64::from(status.as_u16()),
                format!("HTTP {} {reason}", status.as_u16()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_request_error(endpoint, &e))?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::malformed(format!("invalid JSON: {e}")))?;

        extract_reply(&value)
    }
}

/// JSON-RPC `message/send` request carrying one user text part
pub fn message_send_request(message: &str, context_id: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": Uuid::new_v4().to_string(),
        "method": "message/send",
        "params": {
            "message": {
                "role": "user",
                "messageId": Uuid::new_v4().to_string(),
                "contextId": context_id,
                "parts": [{"kind": "text", "text": message}]
            }
        }
    })
}

/// Reply text from a JSON-RPC response body.
///
/// An `error` member is a rejection. A `message` result yields its text parts; a `task`
/// result yields its status message text, then artifact text. A well-formed result
/// without text is acknowledged.
pub fn extract_reply(response: &Value) -> Result<PeerReply, TransportError> {
    let Some(object) = response.as_object() else {
        return Err(TransportError::malformed("response is not a JSON object"));
    };

    if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32000);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("peer returned an error")
            .to_string();
        return Err(TransportError::rejected(code, message));
    }

    let Some(result) = object.get("result").filter(|r| !r.is_null()) else {
        return Err(TransportError::malformed(
            "response has neither result nor error",
        ));
    };
    if !result.is_object() {
        return Err(TransportError::malformed("result is not an object"));
    }

    let mut texts = Vec::new();
    match result.get("kind").and_then(Value::as_str) {
        Some("message") => collect_part_texts(result.get("parts"), &mut texts),
        Some("task") | None => {
            collect_part_texts(
                result.get("status").and_then(|s| s.get("message")).and_then(|m| m.get("parts")),
                &mut texts,
            );
            if let Some(artifacts) = result.get("artifacts").and_then(Value::as_array) {
                for artifact in artifacts {
                    collect_part_texts(artifact.get("parts"), &mut texts);
                }
            }
            if result.get("kind").is_none() {
                collect_part_texts(result.get("parts"), &mut texts);
            }
        }
        Some(other) => {
            return Err(TransportError::malformed(format!(
                "unexpected result kind '{other}'"
            )))
        }
    }

    if texts.is_empty() {
        Ok(PeerReply::new(defaults::ACKNOWLEDGED_REPLY))
    } else {
        Ok(PeerReply::new(texts.join("\n")))
    }
}

fn collect_part_texts(parts: Option<&Value>, texts: &mut Vec<String>) {
    let Some(parts) = parts.and_then(Value::as_array) else {
        return;
    };
    texts.extend(
        parts
            .iter()
            .filter(|part| {
                part.get("kind")
                    .and_then(Value::as_str)
                    .map_or(true, |kind| kind == "text")
            })
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string),
    );
}

fn classify_request_error(endpoint: &str, error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else if error.is_decode() {
        TransportError::malformed(format!("undecodable body: {error}"))
    } else {
        TransportError::Unreachable {
            endpoint: endpoint.to_string(),
            reason: error.to_string(),
        }
    }
}
