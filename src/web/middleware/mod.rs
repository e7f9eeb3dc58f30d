//! # Web API Middleware
//!
//! Request tracing and CORS. No request timeout layer: dispatch streams stay open for
//! the whole run.

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::web::state::AppState;

/// Apply the middleware stack for a router with app state
pub fn apply_middleware_stack(router: Router<AppState>) -> Router<AppState> {
    router
        .layer(create_cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
