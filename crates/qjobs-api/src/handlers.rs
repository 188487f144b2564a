//! Route handlers for the control plane.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use qjobs_core::{JobId, Priority};
use qjobs_engine::NewJob;

use crate::state::AppState;
use crate::types::{
    EnqueueRequest, EnqueueResponse, ErrorResponse, JobStatusResponse, QueuePeekView, QueueSizesView, QueuesResponse,
    RecentJobEntry, RecentResponse, TickResponse,
};

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

fn err(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

pub async fn enqueue(State(state): State<AppState>, Json(req): Json<EnqueueRequest>) -> axum::response::Response {
    if req.job_type.trim().is_empty() {
        return err(StatusCode::UNPROCESSABLE_ENTITY, "type must not be empty");
    }
    if req.delay_sec < 0.0 {
        return err(StatusCode::UNPROCESSABLE_ENTITY, "delay_sec must be >= 0");
    }
    if req.backoff_sec <= 1.0 {
        return err(StatusCode::UNPROCESSABLE_ENTITY, "backoff_sec must be > 1.0");
    }
    let Some(priority) = Priority::parse(&req.priority) else {
        return err(StatusCode::UNPROCESSABLE_ENTITY, format!("unknown priority: {}", req.priority));
    };

    let new_job = NewJob {
        job_type: req.job_type,
        payload: req.payload,
        delay_sec: req.delay_sec,
        max_retries: Some(req.max_retries),
        backoff_sec: Some(req.backoff_sec),
        priority: Some(priority),
    };

    match state.engine.enqueue(new_job, req.delay_sec).await {
        Ok(job) => {
            let labels = [("priority", priority.as_str())];
            if let Err(e) = state.metrics.inc_counter(qjobs_metrics::names::ENQUEUED_TOTAL, &labels, 1.0).await {
                tracing::warn!(error = %e, "failed to record enqueue metric");
            }
            Json(EnqueueResponse {
                id: job.id.as_str(),
                status: job.status.as_str().to_string(),
                priority: job.priority.as_str().to_string(),
            })
            .into_response()
        }
        Err(e) => err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn get_job(State(state): State<AppState>, Path(job_id): Path<String>) -> axum::response::Response {
    let Ok(id) = JobId::parse(&job_id) else {
        return err(StatusCode::NOT_FOUND, format!("job {job_id} not found"));
    };

    match state.engine.get_job(id).await {
        Ok(Some(job)) => Json(JobStatusResponse {
            id: job.id.as_str(),
            job_type: job.job_type,
            status: job.status.as_str().to_string(),
            attempts: job.attempts,
            result: job.result,
            error: job.error,
            priority: job.priority.as_str().to_string(),
        })
        .into_response(),
        Ok(None) => err(StatusCode::NOT_FOUND, format!("job {job_id} not found")),
        Err(e) => err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn tick(State(state): State<AppState>) -> axum::response::Response {
    match state.engine.promote_due().await {
        Ok(moved) => Json(TickResponse { moved }).into_response(),
        Err(e) => err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn metrics(State(state): State<AppState>) -> axum::response::Response {
    match qjobs_metrics::render_prometheus(&state.store, &state.engine, state.version).await {
        Ok(text) => ([("content-type", "text/plain; version=0.0.4")], text).into_response(),
        Err(e) => err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn queues(State(state): State<AppState>) -> axum::response::Response {
    let sizes = match state.engine.queue_sizes().await {
        Ok(s) => s,
        Err(e) => return err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let (high_peek, default_peek, low_peek, dead_peek) = (
        state.engine.peek_queue(Priority::High).await,
        state.engine.peek_queue(Priority::Default).await,
        state.engine.peek_queue(Priority::Low).await,
        state.engine.peek_deadletter().await,
    );

    let unwrap_peek = |r: qjobs_core::JobResult<Vec<String>>| r.unwrap_or_default();

    Json(QueuesResponse {
        sizes: QueueSizesView {
            high: sizes.high,
            default: sizes.default,
            low: sizes.low,
            scheduled: sizes.scheduled,
            deadletter: sizes.deadletter,
        },
        peek: QueuePeekView {
            high: unwrap_peek(high_peek),
            default: unwrap_peek(default_peek),
            low: unwrap_peek(low_peek),
            deadletter: unwrap_peek(dead_peek),
        },
    })
    .into_response()
}

pub async fn recent(State(state): State<AppState>) -> axum::response::Response {
    match state.engine.recent_jobs().await {
        Ok(jobs) => Json(RecentResponse {
            recent: jobs
                .into_iter()
                .map(|job| RecentJobEntry {
                    id: job.id.as_str(),
                    job_type: job.job_type,
                    priority: job.priority.as_str().to_string(),
                    status: job.status.as_str().to_string(),
                    attempts: job.attempts,
                    error: job.error,
                    updated_at: job.updated_at,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
