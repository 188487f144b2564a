//! Job queue error types.

use thiserror::Error;

/// Result type for job queue operations.
pub type JobResult<T> = Result<T, JobError>;

/// Errors surfaced by the store, engine, worker, and control plane.
#[derive(Debug, Error)]
pub enum JobError {
    /// Request payload failed validation (bad priority, negative delay, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Underlying Redis command failed.
    #[error("store error: {0}")]
    Store(#[from] redis::RedisError),

    /// Could not check out a pooled connection.
    #[error("store pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Job id has no corresponding `job:<id>` hash.
    #[error("job not found: {0}")]
    NotFound(String),

    /// A registered handler returned an error while executing a job.
    #[error("handler failed: {0}")]
    HandlerFailed(String),

    /// No handler is registered for the job's `type`.
    #[error("unknown task type: {0}")]
    UnknownTaskType(String),

    /// Failure encoding or decoding a job's JSON fields.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl JobError {
    /// Whether this error class represents a transient condition the
    /// worker should retry rather than treat as a permanent failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JobError::Store(_) | JobError::Pool(_) | JobError::HandlerFailed(_) | JobError::UnknownTaskType(_)
        )
    }
}
