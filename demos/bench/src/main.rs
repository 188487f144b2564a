//! Synthetic load generator for the job queue's control plane: enqueues
//! `sleep` jobs at a configurable concurrency, polls each until it
//! reaches a terminal status, and reports enqueue and completion
//! throughput separately.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(about = "Load generator for the job queue HTTP control plane")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    api: String,

    #[arg(long, default_value_t = 100)]
    jobs: usize,

    #[arg(long, default_value_t = 10)]
    concurrency: usize,

    #[arg(long, default_value_t = 1.0)]
    seconds_per_job: f64,

    #[arg(long, default_value = "default")]
    priority: String,
}

async fn enqueue_job(client: &reqwest::Client, api: &str, seconds: f64, priority: &str) -> reqwest::Result<String> {
    let response = client
        .post(format!("{api}/jobs"))
        .json(&json!({
            "type": "sleep",
            "payload": {"seconds": seconds},
            "priority": priority,
        }))
        .send()
        .await?
        .error_for_status()?;
    let body: serde_json::Value = response.json().await?;
    Ok(body["id"].as_str().unwrap_or_default().to_string())
}

/// Polls `GET /jobs/{id}` until the job reaches `succeeded`, `failed`, or
/// `dead`, treating a transient 404 (the record not yet visible) as a
/// reason to keep retrying rather than fail.
async fn poll_until_done(client: &reqwest::Client, api: &str, id: &str) -> bool {
    loop {
        match client.get(format!("{api}/jobs/{id}")).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::NOT_FOUND => {
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
            Ok(response) => match response.json::<serde_json::Value>().await {
                Ok(body) => match body["status"].as_str() {
                    Some("succeeded") => return true,
                    Some("failed") | Some("dead") => return false,
                    _ => tokio::time::sleep(Duration::from_millis(100)).await,
                },
                Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
            },
            Err(e) => {
                warn!(error = %e, "poll request failed, retrying");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

async fn run_benchmark(args: &Args) {
    let client = reqwest::Client::new();
    let semaphore = Arc::new(Semaphore::new(args.concurrency));

    let enqueue_start = Instant::now();
    let mut enqueue_handles = Vec::with_capacity(args.jobs);
    for _ in 0..args.jobs {
        let client = client.clone();
        let api = args.api.clone();
        let priority = args.priority.clone();
        let seconds = args.seconds_per_job;
        let semaphore = semaphore.clone();
        enqueue_handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            enqueue_job(&client, &api, seconds, &priority).await
        }));
    }

    let mut ids = Vec::with_capacity(args.jobs);
    for handle in enqueue_handles {
        match handle.await.expect("enqueue task panicked") {
            Ok(id) => ids.push(id),
            Err(e) => warn!(error = %e, "failed to enqueue job"),
        }
    }
    let enqueue_elapsed = enqueue_start.elapsed();

    let completion_start = Instant::now();
    let mut completion_handles = Vec::with_capacity(ids.len());
    for id in ids {
        let client = client.clone();
        let api = args.api.clone();
        completion_handles.push(tokio::spawn(async move { poll_until_done(&client, &api, &id).await }));
    }

    let mut succeeded = 0usize;
    for handle in completion_handles {
        if handle.await.expect("poll task panicked") {
            succeeded += 1;
        }
    }
    let completion_elapsed = completion_start.elapsed();

    info!(
        jobs = args.jobs,
        succeeded,
        enqueue_secs = enqueue_elapsed.as_secs_f64(),
        enqueue_throughput = args.jobs as f64 / enqueue_elapsed.as_secs_f64(),
        completion_secs = completion_elapsed.as_secs_f64(),
        completion_throughput = args.jobs as f64 / completion_elapsed.as_secs_f64(),
        "benchmark complete"
    );
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new("info")).init();
    let args = Args::parse();
    run_benchmark(&args).await;
}
