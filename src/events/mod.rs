//! # Progress Events
//!
//! Typed progress events and the ordered per-run emitter that delivers them to the
//! caller's stream.

pub mod emitter;
pub mod types;

pub use emitter::{Delivery, EmitError, EventEmitter};
pub use types::{EmittedEvent, ProgressEvent};
