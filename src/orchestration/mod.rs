//! # Orchestration Engine
//!
//! Plans and executes dispatch for one request at a time.
//!
//! ## Core Components
//!
//! - **DispatchPlanner**: strategy producing the ordered step list; `KeywordPlanner` is
//!   the rule-based implementation
//! - **PeerTransport**: sends one message to one peer; `A2aHttpTransport` speaks A2A
//!   JSON-RPC
//! - **StepExecutor**: runs a single step under a timeout and settles its outcome
//! - **ErrorClassifier**: maps transport errors and timeouts to typed step failures
//! - **DispatchOrchestrator**: drives discovery, planning and sequential execution,
//!   emitting progress after every transition
//!
//! Discovery fans out concurrently; dispatch is strictly sequential, one step in flight
//! at a time, so progress reads as "step i of N".

pub mod error_classifier;
pub mod orchestrator;
pub mod planner;
pub mod step_executor;
pub mod transport;
pub mod types;

pub use error_classifier::{
    ErrorClassification, ErrorClassifier, ErrorContext, StandardErrorClassifier,
};
pub use orchestrator::DispatchOrchestrator;
pub use planner::{ensure_resolved_targets, DispatchPlanner, KeywordPlanner};
pub use step_executor::StepExecutor;
pub use transport::{
    extract_reply, message_send_request, A2aHttpTransport, PeerTransport, TransportError,
};
pub use types::{PeerReply, PlanningError, StepFailureKind, StepOutcome};
