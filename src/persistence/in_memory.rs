use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::{StoreError, TaskStore};
use crate::models::TaskSnapshot;

/// Process-local store keeping the latest snapshot per task.
///
/// When `capacity` is reached, the least recently updated task is evicted.
#[derive(Debug)]
pub struct InMemoryTaskStore {
    tasks: DashMap<String, TaskSnapshot>,
    capacity: usize,
}

impl InMemoryTaskStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .tasks
            .iter()
            .min_by_key(|entry| entry.value().updated_at)
            .map(|entry| entry.key().clone());
        if let Some(task_id) = oldest {
            self.tasks.remove(&task_id);
            debug!(task_id = %task_id, "Evicted oldest task snapshot");
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new(crate::constants::defaults::RECENT_TASK_LIMIT)
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn save(&self, snapshot: &TaskSnapshot) -> Result<(), StoreError> {
        if snapshot.task_id.is_empty() {
            return Err(StoreError::Rejected {
                task_id: String::new(),
                reason: "empty task id".to_string(),
            });
        }
        if !self.tasks.contains_key(&snapshot.task_id) && self.tasks.len() >= self.capacity {
            self.evict_oldest();
        }
        self.tasks
            .insert(snapshot.task_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn get(&self, task_id: &str) -> Result<Option<TaskSnapshot>, StoreError> {
        Ok(self.tasks.get(task_id).map(|entry| entry.value().clone()))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<TaskSnapshot>, StoreError> {
        let mut snapshots: Vec<TaskSnapshot> = self
            .tasks
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        snapshots.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        snapshots.truncate(limit);
        Ok(snapshots)
    }
}
