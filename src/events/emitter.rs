use chrono::Utc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{EmittedEvent, ProgressEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("Task {task_id} already emitted its terminal event")]
    AlreadyTerminated { task_id: String },
}

/// What happened to an accepted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered { sequence: u64 },
    /// The caller is gone; the event was discarded
    Discarded,
}

/// Ordered, append-only progress stream for one run.
///
/// Sends wait for channel capacity rather than dropping, so events reach the caller in
/// exactly the order they were emitted. When the receiving side is gone, the run's
/// cancellation token is triggered and further emits become no-ops.
#[derive(Debug)]
pub struct EventEmitter {
    sender: mpsc::Sender<EmittedEvent>,
    cancel: CancellationToken,
    next_sequence: u64,
    terminated: bool,
    disconnected: bool,
}

impl EventEmitter {
    /// Create an emitter and the receiver the caller reads from
    pub fn channel(
        capacity: usize,
        cancel: CancellationToken,
    ) -> (Self, mpsc::Receiver<EmittedEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                cancel,
                next_sequence: 1,
                terminated: false,
                disconnected: false,
            },
            receiver,
        )
    }

    pub async fn emit(&mut self, event: ProgressEvent) -> Result<Delivery, EmitError> {
        if self.terminated {
            return Err(EmitError::AlreadyTerminated {
                task_id: event.task_id().to_string(),
            });
        }
        if event.is_terminal() {
            self.terminated = true;
        }
        if self.disconnected {
            return Ok(Delivery::Discarded);
        }

        let sequence = self.next_sequence;
        let emitted = EmittedEvent {
            sequence,
            emitted_at: Utc::now(),
            event,
        };

        match self.sender.send(emitted).await {
            Ok(()) => {
                self.next_sequence += 1;
                debug!(sequence, "Progress event delivered");
                Ok(Delivery::Delivered { sequence })
            }
            Err(mpsc::error::SendError(lost)) => {
                warn!(
                    task_id = %lost.event.task_id(),
                    sequence,
                    "Event stream receiver closed, cancelling run"
                );
                self.disconnected = true;
                self.cancel.cancel();
                Ok(Delivery::Discarded)
            }
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected || self.sender.is_closed()
    }
}
