#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Dispatch Core
//!
//! Peer discovery and step-based dispatch orchestration with streamed progress events.
//!
//! ## Overview
//!
//! A request arrives as free text plus optional hints. The orchestrator resolves the
//! currently registered peers concurrently, plans an ordered list of dispatch steps
//! against the peers that answered, sends one message per step in plan order, and
//! streams a progress event after every state change. Every run ends with exactly one
//! terminal status event.
//!
//! ## Architecture
//!
//! ```text
//! registry ──▶ PeerSnapshot ──▶ PeerDirectory (concurrent card resolution)
//!                                    │
//!                                    ▼
//!                             DispatchPlanner ──▶ ordered DispatchSteps
//!                                    │
//!                                    ▼
//!          DispatchOrchestrator ──▶ StepExecutor ──▶ PeerTransport (A2A JSON-RPC)
//!                │
//!                ├──▶ TaskStateMachine (task and step lifecycle)
//!                ├──▶ EventEmitter ──▶ SSE stream
//!                └──▶ TaskStore (optional)
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - YAML configuration with environment overrides
//! - [`registry`] - Candidate sources and per-request snapshots
//! - [`discovery`] - Card resolution and the concurrent peer directory
//! - [`orchestration`] - Planning, step execution and the orchestrator
//! - [`state_machine`] - Task and step lifecycles
//! - [`events`] - Progress events and the ordered emitter
//! - [`persistence`] - Task snapshot storage
//! - [`web`] - axum HTTP surface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dispatch_core::config::DispatchConfig;
//! use dispatch_core::events::EventEmitter;
//! use dispatch_core::models::DispatchRequest;
//! use dispatch_core::orchestration::DispatchOrchestrator;
//! use dispatch_core::registry::PeerSnapshot;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let config = Arc::new(DispatchConfig::default());
//! let orchestrator = DispatchOrchestrator::from_config(config, reqwest::Client::new());
//! let snapshot = PeerSnapshot::from_addresses(["http://localhost:9001", "http://localhost:9002"]);
//!
//! let cancel = CancellationToken::new();
//! let (emitter, mut events) = EventEmitter::channel(64, cancel.clone());
//! let run = orchestrator.run(
//!     DispatchRequest::new("Fire at 5th and Main, two people injured"),
//!     &snapshot,
//!     emitter,
//!     cancel,
//! );
//! let printer = async {
//!     while let Some(event) = events.recv().await {
//!         println!("{} {:?}", event.sequence, event.event);
//!     }
//! };
//! let (task, ()) = tokio::join!(run, printer);
//! println!("finished as {}", task.status);
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod persistence;
pub mod registry;
pub mod state_machine;
pub mod web;

pub use config::{ConfigManager, DispatchConfig};
pub use error::{DispatchError, Result};
pub use events::{EmittedEvent, EventEmitter, ProgressEvent};
pub use models::{DispatchRequest, PeerDescriptor, TaskSnapshot};
pub use orchestration::{DispatchOrchestrator, DispatchPlanner, KeywordPlanner, StepOutcome};
pub use state_machine::{StepState, TaskState};
