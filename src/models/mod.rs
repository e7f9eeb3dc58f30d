//! # Data Model
//!
//! Peers as they are registered and resolved, the caller's request, and the task/step
//! records the orchestrator owns for the lifetime of one run.

pub mod peer;
pub mod request;
pub mod task;

pub use peer::{AgentCard, AgentSkill, PeerDescriptor, PeerRef, PeerSkill, RegisteredPeer};
pub use request::{DispatchRequest, RequestHints};
pub use task::{DispatchStep, StepError, Task, TaskSnapshot};
