//! # Dispatch Handler
//!
//! `POST /v1/dispatch` starts one orchestrator run and streams its progress events as
//! server-sent events. Frames carry `event: status|message|error`, `id: <sequence>` and
//! the JSON-encoded [`EmittedEvent`] as data; the stream closes after the final status.
//!
//! Dropping the response stream (client disconnect) cancels the run.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::stream::unfold;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::constants::events;
use crate::events::{EmittedEvent, EventEmitter};
use crate::models::{DispatchRequest, Task};
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

const EVENT_STREAM: &str = "text/event-stream";

/// Start a dispatch run: POST /v1/dispatch
pub async fn dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DispatchRequest>,
) -> ApiResult<Response> {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if !accept.contains(EVENT_STREAM) {
        return Err(ApiError::not_acceptable(
            "Accept header must include text/event-stream",
        ));
    }
    request.validate()?;

    let snapshot = state.capture_snapshot().await;
    let task = Task::new(request);
    info!(
        task_id = %task.task_id(),
        context_id = %task.context_id(),
        candidates = snapshot.len(),
        "Dispatch request accepted"
    );

    let cancel = CancellationToken::new();
    let (emitter, receiver) =
        EventEmitter::channel(state.config.server.event_channel_capacity, cancel.clone());

    let orchestrator = state.orchestrator.clone();
    let run_cancel = cancel.clone();
    tokio::spawn(async move {
        orchestrator
            .run_task(task, &snapshot, emitter, run_cancel)
            .await;
    });

    // Dropping the stream before the final event drops the guard and cancels the run
    let guard = cancel.drop_guard();
    let stream = unfold(
        (receiver, guard, false),
        |(mut receiver, guard, finished)| async move {
            if finished {
                return None;
            }
            let emitted = receiver.recv().await?;
            let finished = emitted.event.is_terminal();
            if finished {
                debug!(task_id = %emitted.event.task_id(), "Final event streamed");
            }
            Some((Ok::<_, Infallible>(to_sse_event(&emitted)), (receiver, guard, finished)))
        },
    );

    let keep_alive =
        KeepAlive::new().interval(Duration::from_secs(state.config.server.keep_alive_secs));
    Ok(Sse::new(stream).keep_alive(keep_alive).into_response())
}

/// One SSE frame per emitted event.
///
/// An event that cannot be encoded is replaced by an `error` frame at the same sequence.
pub fn to_sse_event(emitted: &EmittedEvent) -> Event {
    let frame = Event::default()
        .event(emitted.event.stream_name())
        .id(emitted.sequence.to_string());
    match frame.json_data(emitted) {
        Ok(frame) => frame,
        Err(error) => {
            warn!(
                task_id = %emitted.event.task_id(),
                sequence = emitted.sequence,
                error = %error,
                "Progress event could not be encoded"
            );
            Event::default()
                .event(events::ERROR)
                .id(emitted.sequence.to_string())
                .data(undeliverable_payload(emitted, &error.to_string()).to_string())
        }
    }
}

fn undeliverable_payload(emitted: &EmittedEvent, reason: &str) -> Value {
    json!({
        "sequence": emitted.sequence,
        "task_id": emitted.event.task_id(),
        "error": format!("event could not be encoded: {reason}"),
    })
}
