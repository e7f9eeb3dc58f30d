//! # Task Handlers
//!
//! Read access to stored task snapshots.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::TaskSnapshot;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

/// Query parameters for task listing
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskSnapshot>,
}

/// Latest snapshot of a task: GET /v1/tasks/{task_id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskSnapshot>> {
    state
        .store
        .get(&task_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Task {task_id}")))
}

/// Most recently updated tasks: GET /v1/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let max = state.config.persistence.recent_task_limit;
    let limit = query.limit.unwrap_or(max).min(max);
    let tasks = state.store.list_recent(limit).await?;
    Ok(Json(TaskListResponse { tasks }))
}
