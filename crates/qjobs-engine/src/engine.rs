//! The queue engine: the five operations a producer/worker pair needs
//! (enqueue, promote_due, blocking_dequeue, mark_succeeded,
//! mark_failed_or_retry) plus the read-only views the control plane
//! exposes (`GET /queues`, `GET /recent`).
//!
//! Priority lanes are plain Redis lists (`LPUSH`/`BLPOP`), drained LIFO
//! within a lane and strictly high-before-default-before-low across
//! lanes. Delayed/scheduled jobs live in a single sorted set keyed by
//! due time, independent of priority — priority only matters once a job
//! is promoted onto a lane list.

use std::cmp::Ordering;

use qjobs_core::{JobId, JobResult, JobStatus, Priority};
use qjobs_store::{keys, StoreClient};
use serde_json::Value;
use tracing::{info, warn};

use crate::job::Job;
use crate::job::NewJob;
use crate::retry::delay_for_attempt;
use crate::time::now_secs;

/// How many due jobs `promote_due` moves from the scheduled set onto
/// lane lists per call, matching the reference worker's per-tick budget.
const PROMOTE_BATCH_LIMIT: isize = 200;

/// How many `job:*` keys `recent_jobs` will load before sorting, bounding
/// the cost of the scan on a large store.
const RECENT_SCAN_CAP: usize = 800;

const RECENT_LIMIT: usize = 50;

#[derive(Clone)]
pub struct QueueEngine {
    store: StoreClient,
}

#[derive(Debug, Clone)]
pub struct QueueSizes {
    pub high: i64,
    pub default: i64,
    pub low: i64,
    pub scheduled: i64,
    pub deadletter: i64,
}

impl QueueEngine {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    async fn save_job(&self, job: &mut Job) -> JobResult<()> {
        job.updated_at = now_secs();
        let key = keys::job(&job.id.as_str());
        self.store.hset_all(&key, &job.to_fields()).await?;
        self.store.expire(&key, qjobs_core::JOB_TTL_SECS).await?;
        Ok(())
    }

    /// Persists a new job and indexes it: onto the scheduled set if it
    /// has a future `delay_sec`, otherwise directly onto its priority
    /// lane. The job hash is always written before the index entry, so a
    /// worker can never observe an index pointing at a missing hash.
    pub async fn enqueue(&self, new: NewJob, delay_sec: f64) -> JobResult<Job> {
        let mut job = Job::from_new(new);
        if delay_sec > 0.0 {
            job.status = JobStatus::Scheduled;
            job.next_run_at = Some(now_secs() + delay_sec);
            self.save_job(&mut job).await?;
            self.store
                .zadd(keys::SCHEDULED, &job.id.as_str(), job.next_run_at.unwrap())
                .await?;
        } else {
            job.status = JobStatus::Queued;
            job.next_run_at = None;
            self.save_job(&mut job).await?;
            self.store.lpush(&keys::queue(job.priority), &job.id.as_str()).await?;
        }
        info!(job_id = %job.id, job_type = %job.job_type, priority = %job.priority, "enqueued job");
        Ok(job)
    }

    /// Moves every job in the scheduled set whose due time has passed
    /// onto its priority lane list, up to [`PROMOTE_BATCH_LIMIT`] per
    /// call. Not transactional: a job a concurrent promoter already
    /// moved is simply re-read as a no-op (its `priority` hash read still
    /// succeeds; pushing it twice is tolerated, see SPEC_FULL.md §9). The
    /// priority lookup and the lpush/zrem/hset writes for the whole batch
    /// each round-trip once, as a pipeline, rather than once per job.
    pub async fn promote_due(&self) -> JobResult<usize> {
        let now = now_secs();
        let due_ids = self.store.zrangebyscore_limit(keys::SCHEDULED, now, PROMOTE_BATCH_LIMIT).await?;
        if due_ids.is_empty() {
            return Ok(0);
        }

        let priority_lookups: Vec<(String, &str)> = due_ids.iter().map(|id| (keys::job(id), "priority")).collect();
        let raw_priorities = self.store.pipeline_hget(&priority_lookups).await?;

        self.store
            .exec_pipeline(|pipe| {
                for (id, raw_priority) in due_ids.iter().zip(raw_priorities.iter()) {
                    let priority = raw_priority.as_deref().and_then(Priority::parse).unwrap_or_default();
                    let job_key = keys::job(id);
                    pipe.lpush(keys::queue(priority), id);
                    pipe.zrem(keys::SCHEDULED, id);
                    pipe.hset(&job_key, "status", JobStatus::Queued.as_str());
                    pipe.hset(&job_key, "updated_at", now.to_string());
                    pipe.hset(&job_key, "next_run_at", "null");
                }
            })
            .await?;

        let moved = due_ids.len();
        info!(moved, "promoted due jobs onto their priority lanes");
        Ok(moved)
    }

    /// Blocks for up to `timeout_secs` on the three priority lanes, in
    /// `high, default, low` order, returning the lane and job id that
    /// popped first, or `None` on timeout.
    pub async fn blocking_dequeue(&self, timeout_secs: f64) -> JobResult<Option<(Priority, JobId)>> {
        let lane_keys: Vec<String> = Priority::ORDER.iter().map(|p| keys::queue(*p)).collect();
        let popped = self.store.blpop_many(&lane_keys, timeout_secs).await?;
        Ok(match popped {
            None => None,
            Some((key, value)) => {
                let priority = Priority::ORDER
                    .iter()
                    .find(|p| keys::queue(**p) == key)
                    .copied()
                    .unwrap_or_default();
                match JobId::parse(&value) {
                    Ok(id) => Some((priority, id)),
                    Err(_) => {
                        warn!(raw = %value, "popped non-uuid job id, dropping");
                        None
                    }
                }
            }
        })
    }

    pub async fn get_job(&self, id: JobId) -> JobResult<Option<Job>> {
        let fields = self.store.hgetall(&keys::job(&id.as_str())).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(Job::from_fields(id, &fields)))
    }

    /// Explicitly transitions a freshly-dequeued job to `processing`. Not
    /// part of the atomic pop itself — spec.md §4.3 calls this out as a
    /// deliberate gap: a worker crash between `blocking_dequeue` and this
    /// write leaves the record stuck reading `queued` with its id already
    /// off every list, effectively lost. No list/set mutation happens here.
    pub async fn mark_processing(&self, job: &mut Job) -> JobResult<()> {
        job.status = JobStatus::Processing;
        self.save_job(job).await
    }

    pub async fn mark_succeeded(&self, job: &mut Job, result: Value) -> JobResult<()> {
        job.status = JobStatus::Succeeded;
        job.result = Some(result);
        job.error = None;
        self.save_job(job).await
    }

    /// Increments the attempt counter and either schedules a retry
    /// (returns `true`) or moves the job to the dead letter list
    /// (returns `false`) once `max_retries` is exhausted.
    pub async fn mark_failed_or_retry(&self, job: &mut Job, error: String) -> JobResult<bool> {
        job.attempts += 1;
        if job.is_exhausted() {
            self.dead_letter(job, error).await?;
            Ok(false)
        } else {
            let delay = delay_for_attempt(job.backoff_sec, job.attempts);
            job.status = JobStatus::Scheduled;
            job.next_run_at = Some(now_secs() + delay);
            job.error = Some(error);
            self.save_job(job).await?;
            self.store
                .zadd(keys::SCHEDULED, &job.id.as_str(), job.next_run_at.unwrap())
                .await?;
            Ok(true)
        }
    }

    /// Dead-letters a job immediately, bypassing the retry budget —
    /// for failures `qjobs_core::JobError::is_retryable` classifies as
    /// non-transient (validation/serialization/not-found), where retrying
    /// would just repeat the same failure `max_retries` times before
    /// reaching the same outcome.
    pub async fn dead_letter_now(&self, job: &mut Job, error: String) -> JobResult<()> {
        job.attempts += 1;
        self.dead_letter(job, error).await
    }

    async fn dead_letter(&self, job: &mut Job, error: String) -> JobResult<()> {
        job.status = JobStatus::Dead;
        job.error = Some(error);
        self.save_job(job).await?;
        self.store.lpush(keys::DEAD_LETTER, &job.id.as_str()).await?;
        warn!(job_id = %job.id, attempts = job.attempts, "job dead-lettered");
        Ok(())
    }

    /// Depth of each lane/scheduled-set/dead-letter list.
    pub async fn queue_sizes(&self) -> JobResult<QueueSizes> {
        Ok(QueueSizes {
            high: self.store.llen(&keys::queue(Priority::High)).await?,
            default: self.store.llen(&keys::queue(Priority::Default)).await?,
            low: self.store.llen(&keys::queue(Priority::Low)).await?,
            scheduled: self.store.zcard(keys::SCHEDULED).await?,
            deadletter: self.store.llen(keys::DEAD_LETTER).await?,
        })
    }

    /// Up to 10 ids from the tail of a priority lane (the oldest items
    /// still waiting, since new items are `LPUSH`ed onto the head).
    pub async fn peek_queue(&self, priority: Priority) -> JobResult<Vec<String>> {
        self.store.lrange(&keys::queue(priority), -10, -1).await
    }

    /// Up to 10 ids from the head of the dead letter list (the most
    /// recently dead-lettered items, since they too are `LPUSH`ed).
    pub async fn peek_deadletter(&self) -> JobResult<Vec<String>> {
        self.store.lrange(keys::DEAD_LETTER, 0, 9).await
    }

    /// The most recently updated jobs across all statuses, newest first.
    /// Scans at most [`RECENT_SCAN_CAP`] `job:*` keys before sorting and
    /// truncating to [`RECENT_LIMIT`] — a deliberate bound, not a
    /// reflection of total job count.
    pub async fn recent_jobs(&self) -> JobResult<Vec<Job>> {
        let mut ids = self.store.keys("job:*").await?;
        ids.truncate(RECENT_SCAN_CAP);

        let mut jobs = Vec::with_capacity(ids.len());
        for key in ids {
            let Some(raw_id) = key.strip_prefix("job:") else { continue };
            let Ok(id) = JobId::parse(raw_id) else { continue };
            let fields = self.store.hgetall(&key).await?;
            if fields.is_empty() {
                continue;
            }
            jobs.push(Job::from_fields(id, &fields));
        }

        jobs.sort_by(|a, b| b.updated_at.partial_cmp(&a.updated_at).unwrap_or(Ordering::Equal));
        jobs.truncate(RECENT_LIMIT);
        Ok(jobs)
    }
}
