//! # Web API Request Handlers
//!
//! HTTP request handlers organized by functional area.

pub mod dispatch;
pub mod health;
pub mod peers;
pub mod tasks;
