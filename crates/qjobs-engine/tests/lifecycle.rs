//! End-to-end lifecycle tests against a real store. Opt in with
//! `cargo test -- --ignored` against a Redis reachable at `REDIS_URL`
//! (a throwaway logical database — these tests `FLUSHDB` on setup).

use qjobs_core::{JobStatus, Priority};
use qjobs_engine::{NewJob, QueueEngine};
use qjobs_store::StoreClient;
use serde_json::json;

async fn test_engine() -> QueueEngine {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/15".into());
    let store = StoreClient::connect(&url, 4).await.expect("connect to test redis");
    let mut conn = store.pool().get().await.expect("checkout connection");
    let _: () = redis::cmd("FLUSHDB").query_async(&mut *conn).await.expect("flush test db");
    QueueEngine::new(store)
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn enqueue_then_dequeue_round_trips_the_job() {
    let engine = test_engine().await;
    let job = engine
        .enqueue(
            NewJob {
                job_type: "echo".into(),
                payload: json!({"msg": "hi"}),
                priority: Some(Priority::High),
                ..Default::default()
            },
            0.0,
        )
        .await
        .unwrap();

    let (priority, id) = engine.blocking_dequeue(1.0).await.unwrap().expect("job should be queued");
    assert_eq!(priority, Priority::High);
    assert_eq!(id, job.id);

    let loaded = engine.get_job(id).await.unwrap().expect("job record should exist");
    assert_eq!(loaded.status, JobStatus::Queued);
    assert_eq!(loaded.payload, json!({"msg": "hi"}));
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn high_priority_drains_before_default() {
    let engine = test_engine().await;
    engine
        .enqueue(NewJob { job_type: "echo".into(), priority: Some(Priority::Default), ..Default::default() }, 0.0)
        .await
        .unwrap();
    engine
        .enqueue(NewJob { job_type: "echo".into(), priority: Some(Priority::High), ..Default::default() }, 0.0)
        .await
        .unwrap();

    let (priority, _) = engine.blocking_dequeue(1.0).await.unwrap().unwrap();
    assert_eq!(priority, Priority::High);
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn delayed_job_is_promoted_once_due() {
    let engine = test_engine().await;
    let job = engine
        .enqueue(NewJob { job_type: "echo".into(), ..Default::default() }, -1.0)
        .await
        .unwrap();
    // delay_sec <= 0 enqueues immediately; force a scheduled path instead.
    let scheduled = engine
        .enqueue(NewJob { job_type: "echo".into(), ..Default::default() }, 0.01)
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(scheduled.status, JobStatus::Scheduled);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let moved = engine.promote_due().await.unwrap();
    assert!(moved >= 1);

    let promoted = engine.get_job(scheduled.id).await.unwrap().unwrap();
    assert_eq!(promoted.status, JobStatus::Queued);
    assert_eq!(promoted.next_run_at, None);
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn exhausting_retries_dead_letters_the_job() {
    let engine = test_engine().await;
    let mut job = engine
        .enqueue(
            NewJob { job_type: "echo".into(), max_retries: Some(1), backoff_sec: Some(1.0), ..Default::default() },
            0.0,
        )
        .await
        .unwrap();

    let retried = engine.mark_failed_or_retry(&mut job, "boom".into()).await.unwrap();
    assert!(retried);
    assert_eq!(job.status, JobStatus::Scheduled);

    let dead = engine.mark_failed_or_retry(&mut job, "boom again".into()).await.unwrap();
    assert!(!dead);
    assert_eq!(job.status, JobStatus::Dead);

    let dlq = engine.peek_deadletter().await.unwrap();
    assert!(dlq.contains(&job.id.as_str()));
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn mark_processing_updates_status_without_touching_any_list() {
    let engine = test_engine().await;
    let mut job = engine
        .enqueue(NewJob { job_type: "echo".into(), ..Default::default() }, 0.0)
        .await
        .unwrap();

    let (_, id) = engine.blocking_dequeue(1.0).await.unwrap().expect("job should be queued");
    assert_eq!(id, job.id);

    engine.mark_processing(&mut job).await.unwrap();
    assert_eq!(job.status, JobStatus::Processing);

    let loaded = engine.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Processing);

    let sizes = engine.queue_sizes().await.unwrap();
    assert_eq!(sizes.default, 0);
    assert_eq!(sizes.scheduled, 0);
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn mark_succeeded_clears_error_and_stores_result() {
    let engine = test_engine().await;
    let mut job = engine
        .enqueue(NewJob { job_type: "echo".into(), ..Default::default() }, 0.0)
        .await
        .unwrap();
    job.error = Some("transient".into());

    engine.mark_succeeded(&mut job, json!({"echo": {"msg": "hi"}})).await.unwrap();

    let loaded = engine.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Succeeded);
    assert_eq!(loaded.error, None);
    assert_eq!(loaded.result, Some(json!({"echo": {"msg": "hi"}})));
}
