//! # Step Failure Classification
//!
//! Turns transport errors and elapsed step timeouts into the typed failure recorded on a
//! step, with a stable error code and a human-readable detail naming the peer.
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ TransportError  │────▶│ ErrorClassifier │────▶│ Classification  │
//! │ + Context       │     │ Strategy        │     │ kind + detail   │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Dispatch is never retried, so classification only describes the failure.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::transport::TransportError;
use super::types::{StepFailureKind, StepOutcome};

/// Context information for error classification
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub task_id: String,
    pub step_id: String,
    /// Name of the peer the step targets
    pub peer_name: String,
    pub endpoint: String,
    /// How long the step ran before failing
    pub execution_duration: Duration,
}

/// Result of error classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorClassification {
    pub kind: StepFailureKind,
    /// Specific error code for tracking
    pub error_code: String,
    /// Detail recorded on the step and reported to the caller
    pub detail: String,
    pub remediation_suggestions: Vec<String>,
}

impl ErrorClassification {
    pub fn into_outcome(self) -> StepOutcome {
        StepOutcome::failure(self.kind, self.detail)
    }
}

/// Trait for error classification strategies
pub trait ErrorClassifier: Send + Sync {
    fn classify_error(&self, error: &TransportError, context: &ErrorContext)
        -> ErrorClassification;

    /// Classify a step that produced no reply within `timeout`
    fn classify_timeout(&self, timeout: Duration, context: &ErrorContext) -> ErrorClassification;
}

#[derive(Debug, Clone, Default)]
pub struct StandardErrorClassifier;

impl StandardErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    fn get_kind_suggestions(&self, kind: StepFailureKind) -> Vec<String> {
        match kind {
            StepFailureKind::Unreachable => vec![
                "Verify the peer is running and registered with a reachable address".to_string(),
                "Check network connectivity to the peer endpoint".to_string(),
            ],
            StepFailureKind::Timeout => vec![
                "Check the peer's load and response times".to_string(),
                "Consider raising execution.step_timeout_ms".to_string(),
            ],
            StepFailureKind::RejectedByPeer => {
                vec!["Review the peer's logs for why it rejected the message".to_string()]
            }
            StepFailureKind::MalformedResponse => {
                vec!["Verify the peer implements A2A message/send".to_string()]
            }
        }
    }
}

impl ErrorClassifier for StandardErrorClassifier {
    fn classify_error(
        &self,
        error: &TransportError,
        context: &ErrorContext,
    ) -> ErrorClassification {
        let kind = error.kind();
        let (error_code, detail) = match error {
            TransportError::Unreachable { reason, .. } => (
                "PEER_UNREACHABLE",
                format!("{} is unreachable: {reason}", context.peer_name),
            ),
            TransportError::Timeout { .. } => (
                "PEER_TIMEOUT",
                format!(
                    "{} timed out after {}ms",
                    context.peer_name,
                    context.execution_duration.as_millis()
                ),
            ),
            TransportError::RejectedByPeer { code, message } => (
                "PEER_REJECTED",
                format!("{} rejected the message ({code}): {message}", context.peer_name),
            ),
            TransportError::MalformedResponse { reason } => (
                "PEER_MALFORMED_RESPONSE",
                format!("{} sent a malformed response: {reason}", context.peer_name),
            ),
        };

        ErrorClassification {
            kind,
            error_code: error_code.to_string(),
            detail,
            remediation_suggestions: self.get_kind_suggestions(kind),
        }
    }

    fn classify_timeout(&self, timeout: Duration, context: &ErrorContext) -> ErrorClassification {
        ErrorClassification {
            kind: StepFailureKind::Timeout,
            error_code: "STEP_TIMEOUT".to_string(),
            detail: format!(
                "{} did not reply within {}ms",
                context.peer_name,
                timeout.as_millis()
            ),
            remediation_suggestions: self.get_kind_suggestions(StepFailureKind::Timeout),
        }
    }
}
