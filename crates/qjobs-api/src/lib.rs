//! HTTP control plane: producer-facing enqueue/status endpoints, the
//! promotion tick, and read-only queue/metrics views.

mod handlers;
mod router;
mod state;
mod types;

pub use router::router;
pub use state::AppState;
pub use types::{EnqueueRequest, EnqueueResponse, JobStatusResponse};
