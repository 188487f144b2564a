//! Metric name constants, so callers never hand-type a name that could
//! drift from what `/metrics` renders.

pub const ENQUEUED_TOTAL: &str = "job_queue_enqueued_total";
pub const PROCESSED_TOTAL: &str = "job_queue_processed_total";
pub const SUCCEEDED_TOTAL: &str = "job_queue_succeeded_total";
pub const FAILED_TOTAL: &str = "job_queue_failed_total";
pub const RETRIES_TOTAL: &str = "job_queue_retries_total";
pub const LATENCY_SECONDS: &str = "job_queue_latency_seconds";

pub const QUEUE_SIZE: &str = "queue_size";
pub const QUEUE_SCHEDULED: &str = "queue_scheduled";
pub const QUEUE_DEADLETTER: &str = "queue_deadletter";
pub const BUILD_INFO: &str = "job_queue_build_info";
