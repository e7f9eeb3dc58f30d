//! # Task Persistence
//!
//! Optional collaborator that keeps the latest snapshot of each task. The orchestrator
//! saves after planning and after the terminal transition; a failing store never affects
//! a run.
//!
//! ```rust
//! use dispatch_core::models::{DispatchRequest, Task};
//! use dispatch_core::persistence::{InMemoryTaskStore, TaskStore};
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryTaskStore::new(10);
//! let snapshot = Task::new(DispatchRequest::new("Fire on Main St")).snapshot();
//! store.save(&snapshot).await.unwrap();
//!
//! let loaded = store.get(&snapshot.task_id).await.unwrap();
//! assert_eq!(loaded, Some(snapshot));
//! # });
//! ```

pub mod in_memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::TaskSnapshot;

pub use in_memory::InMemoryTaskStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Task store unavailable: {0}")]
    Unavailable(String),

    #[error("Task snapshot for {task_id} rejected: {reason}")]
    Rejected { task_id: String, reason: String },
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert or replace the snapshot for its task id
    async fn save(&self, snapshot: &TaskSnapshot) -> Result<(), StoreError>;

    async fn get(&self, task_id: &str) -> Result<Option<TaskSnapshot>, StoreError>;

    /// Most recently updated first
    async fn list_recent(&self, limit: usize) -> Result<Vec<TaskSnapshot>, StoreError>;
}
