//! # Web API
//!
//! axum HTTP surface for the dispatch orchestrator.
//!
//! ## Routes
//!
//! - `POST /v1/dispatch`: run a dispatch, streaming progress as server-sent events
//! - `GET /v1/peers`: resolve the current registry snapshot
//! - `GET /v1/tasks`: most recently updated task snapshots
//! - `GET /v1/tasks/{task_id}`: latest snapshot of one task
//! - `GET /health`: liveness

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

pub use errors::{ApiError, ApiResult};
pub use state::AppState;

/// Build the application router
pub fn create_app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health::basic_health))
        .route("/v1/dispatch", post(handlers::dispatch::dispatch))
        .route("/v1/peers", get(handlers::peers::list_peers))
        .route("/v1/tasks", get(handlers::tasks::list_tasks))
        .route("/v1/tasks/{task_id}", get(handlers::tasks::get_task));

    middleware::apply_middleware_stack(router).with_state(state)
}

/// Serve the application on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;
    info!(address = %address, "Dispatch server listening");
    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown)
        .await
}
