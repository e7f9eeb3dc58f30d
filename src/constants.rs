//! # System Constants
//!
//! Event names, well-known peer paths, and the defaults that define the operational
//! boundaries of discovery and dispatch.

use crate::state_machine::{StepState, TaskState};

/// Names of the lifecycle events logged and streamed by the orchestrator
pub mod events {
    // Caller-facing stream discriminators
    pub const STATUS: &str = "status";
    pub const MESSAGE: &str = "message";
    pub const ERROR: &str = "error";

    // Task lifecycle
    pub const TASK_RECEIVED: &str = "task.received";
    pub const TASK_PLANNED: &str = "task.planned";
    pub const TASK_STARTED: &str = "task.started";
    pub const TASK_COMPLETED: &str = "task.completed";
    pub const TASK_PARTIALLY_FAILED: &str = "task.partially_failed";
    pub const TASK_FAILED: &str = "task.failed";
    pub const TASK_NOTHING_TO_DISPATCH: &str = "task.nothing_to_dispatch";
    pub const TASK_CANCELLED: &str = "task.cancelled";

    // Step lifecycle
    pub const STEP_STARTED: &str = "step.started";
    pub const STEP_COMPLETED: &str = "step.completed";
    pub const STEP_FAILED: &str = "step.failed";

    // Discovery
    pub const DISCOVERY_STARTED: &str = "discovery.started";
    pub const DISCOVERY_COMPLETED: &str = "discovery.completed";
    pub const DISCOVERY_CANDIDATE_DROPPED: &str = "discovery.candidate_dropped";
}

/// Well-known HTTP paths on peers and on the registration store
pub mod paths {
    pub const AGENT_CARD: &str = "/.well-known/agent-card.json";
    pub const LEGACY_AGENT_CARD: &str = "/.well-known/agent.json";
    pub const REGISTRY_AGENTS: &str = "/agents";
}

/// Default operational values used when configuration omits them
pub mod defaults {
    pub const PER_CALL_TIMEOUT_MS: u64 = 5_000;
    pub const OVERALL_BUDGET_MS: u64 = 10_000;
    pub const STEP_TIMEOUT_MS: u64 = 30_000;
    pub const EVENT_CHANNEL_CAPACITY: usize = 64;
    pub const KEEP_ALIVE_SECS: u64 = 15;
    pub const BIND_ADDRESS: &str = "0.0.0.0:8000";
    pub const MESSAGE_TEMPLATE: &str = "Emergency dispatch: {request}";
    pub const REQUEST_PLACEHOLDER: &str = "{request}";
    pub const ACKNOWLEDGED_REPLY: &str = "Acknowledged";
    pub const RECENT_TASK_LIMIT: usize = 50;
    pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;
    pub const BUDGET_EXHAUSTED_DETAIL: &str = "execution budget exhausted";
    pub const NO_PEERS_REASON: &str = "NoPeersAvailable";
}

/// Status groupings used by the orchestrator and web layer
pub mod status_groups {
    use super::{StepState, TaskState};

    pub const TASK_TERMINAL_STATES: [TaskState; 5] = [
        TaskState::Completed,
        TaskState::PartiallyFailed,
        TaskState::Failed,
        TaskState::NothingToDispatch,
        TaskState::Cancelled,
    ];

    /// Terminal task states reported as success to the caller
    pub const TASK_SUCCESS_STATES: [TaskState; 2] =
        [TaskState::Completed, TaskState::NothingToDispatch];

    pub const STEP_FINISHED_STATES: [StepState; 2] = [StepState::Completed, StepState::Failed];
}
