//! Application router.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/jobs", post(handlers::enqueue))
        .route("/jobs/:job_id", get(handlers::get_job))
        .route("/_tick", post(handlers::tick))
        .route("/metrics", get(handlers::metrics))
        .route("/queues", get(handlers::queues))
        .route("/recent", get(handlers::recent))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
