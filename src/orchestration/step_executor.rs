//! # Step Executor
//!
//! Executes one dispatch step: sends the step's message to its target peer through the
//! [`PeerTransport`], bounded by a timeout, and settles into a [`StepOutcome`].
//!
//! One call per step, never batched. Every outcome, including transport errors and
//! elapsed timeouts, is a returned value; nothing propagates past `execute`.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, instrument, warn};

use super::error_classifier::{ErrorClassifier, ErrorContext, StandardErrorClassifier};
use super::transport::PeerTransport;
use super::types::StepOutcome;
use crate::constants::events;
use crate::logging::log_step_operation;
use crate::models::DispatchStep;

#[derive(Clone)]
pub struct StepExecutor {
    transport: Arc<dyn PeerTransport>,
    classifier: Arc<dyn ErrorClassifier>,
}

impl StepExecutor {
    pub fn new(transport: Arc<dyn PeerTransport>) -> Self {
        Self::with_classifier(transport, Arc::new(StandardErrorClassifier::new()))
    }

    pub fn with_classifier(
        transport: Arc<dyn PeerTransport>,
        classifier: Arc<dyn ErrorClassifier>,
    ) -> Self {
        Self {
            transport,
            classifier,
        }
    }

    /// Send the step's message and wait at most `step_timeout` for the reply
    #[instrument(skip(self, step), fields(step_id = %step.step_id, peer = %step.target.name))]
    pub async fn execute(
        &self,
        task_id: &str,
        context_id: &str,
        step: &DispatchStep,
        step_timeout: Duration,
    ) -> StepOutcome {
        let started = Instant::now();
        debug!(
            endpoint = %step.target.endpoint,
            timeout_ms = step_timeout.as_millis() as u64,
            "Dispatching step"
        );

        let result = timeout(
            step_timeout,
            self.transport
                .send_message(&step.target.endpoint, &step.message, context_id),
        )
        .await;

        let context = ErrorContext {
            task_id: task_id.to_string(),
            step_id: step.step_id.clone(),
            peer_name: step.target.name.clone(),
            endpoint: step.target.endpoint.clone(),
            execution_duration: started.elapsed(),
        };

        let outcome = match result {
            Ok(Ok(reply)) => StepOutcome::success(reply.text),
            Ok(Err(error)) => {
                let classification = self.classifier.classify_error(&error, &context);
                warn!(
                    error_code = %classification.error_code,
                    kind = %classification.kind,
                    error = %error,
                    suggestions = ?classification.remediation_suggestions,
                    "Step dispatch failed"
                );
                classification.into_outcome()
            }
            Err(_elapsed) => {
                let classification = self.classifier.classify_timeout(step_timeout, &context);
                warn!(
                    error_code = %classification.error_code,
                    suggestions = ?classification.remediation_suggestions,
                    "Step dispatch timed out"
                );
                classification.into_outcome()
            }
        };

        let (event, status) = match &outcome {
            StepOutcome::Success { .. } => (events::STEP_COMPLETED, "completed"),
            StepOutcome::Failure { kind, .. } => (events::STEP_FAILED, kind.as_str()),
        };
        log_step_operation(
            event,
            Some(task_id),
            Some(&step.step_id),
            Some(&step.target.name),
            status,
            Some(format!("{}ms", context.execution_duration.as_millis()).as_str()),
        );

        outcome
    }
}
