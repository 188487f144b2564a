//! The worker's single-threaded cooperative loop.
//!
//! One iteration: promote due jobs, block for the next job across the
//! three priority lanes, dispatch it to its handler, and record the
//! outcome. There is no in-process concurrency here — running more
//! workers means running more OS processes, each with its own loop.

use std::time::Duration;

use qjobs_core::JobResult;
use qjobs_engine::QueueEngine;
use qjobs_metrics::{names, MetricsSink};
use tracing::{info, warn};

use crate::handler::HandlerRegistry;

/// How long `blocking_dequeue` waits per iteration before returning
/// `None`, matching the reference worker's poll timeout.
const DEQUEUE_TIMEOUT_SECS: f64 = 2.0;

pub struct Worker {
    engine: QueueEngine,
    metrics: MetricsSink,
    handlers: HandlerRegistry,
}

impl Worker {
    pub fn new(engine: QueueEngine, metrics: MetricsSink, handlers: HandlerRegistry) -> Self {
        Self { engine, metrics, handlers }
    }

    /// Runs until `shutdown` resolves. Idle iterations back off per the
    /// reference worker's formula (`min(0.5 + idle_loops * 0.05, 2.0)`
    /// seconds), reset to zero as soon as any job is processed.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        info!("worker started, polling for jobs");
        let mut idle_loops: u32 = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = shutdown.changed() => break,
                worked = self.process_one() => {
                    match worked {
                        Ok(true) => idle_loops = 0,
                        Ok(false) => {
                            idle_loops += 1;
                            let backoff = (0.5 + idle_loops as f64 * 0.05).min(2.0);
                            tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
                        }
                        Err(e) => {
                            warn!(error = %e, "worker iteration failed");
                            idle_loops += 1;
                        }
                    }
                }
            }
        }
        info!("worker shutting down");
    }

    /// Performs one iteration: promote, dequeue, dispatch. Returns
    /// `Ok(true)` if a job was processed (success, retry, or dead
    /// letter), `Ok(false)` if the dequeue timed out with nothing to do.
    pub async fn process_one(&self) -> JobResult<bool> {
        self.engine.promote_due().await?;

        let Some((priority, id)) = self.engine.blocking_dequeue(DEQUEUE_TIMEOUT_SECS).await? else {
            return Ok(false);
        };

        let Some(mut job) = self.engine.get_job(id).await? else {
            warn!(job_id = %id, "dequeued id has no job record, dropping");
            return Ok(false);
        };

        info!(job_id = %job.id, job_type = %job.job_type, priority = %priority, "processing job");
        self.engine.mark_processing(&mut job).await?;
        let priority_label = [("priority", priority.as_str())];
        self.metrics.inc_counter(names::PROCESSED_TOTAL, &priority_label, 1.0).await?;

        let Some(handler) = self.handlers.get(&job.job_type) else {
            self.metrics
                .inc_counter(names::FAILED_TOTAL, &[("reason", "unknown_task"), ("priority", priority.as_str())], 1.0)
                .await?;
            self.engine
                .mark_failed_or_retry(&mut job, format!("Unknown task type: {}", job.job_type))
                .await?;
            return Ok(true);
        };

        match handler(job.payload.clone()).await {
            Ok(result) => {
                let latency = crate::now_secs() - job.created_at;
                self.engine.mark_succeeded(&mut job, result).await?;
                self.metrics.inc_counter(names::SUCCEEDED_TOTAL, &priority_label, 1.0).await?;
                self.metrics.observe_histogram(names::LATENCY_SECONDS, &priority_label, latency).await?;
                info!(job_id = %job.id, status = "succeeded", priority = %priority, "job done");
            }
            Err(e) => {
                self.metrics
                    .inc_counter(names::FAILED_TOTAL, &[("reason", "exception"), ("priority", priority.as_str())], 1.0)
                    .await?;
                if e.is_retryable() {
                    let retried = self.engine.mark_failed_or_retry(&mut job, e.to_string()).await?;
                    if retried {
                        self.metrics.inc_counter(names::RETRIES_TOTAL, &priority_label, 1.0).await?;
                    }
                } else {
                    warn!(job_id = %job.id, error = %e, "non-retryable handler error, dead-lettering immediately");
                    self.engine.dead_letter_now(&mut job, e.to_string()).await?;
                }
            }
        }
        Ok(true)
    }
}
