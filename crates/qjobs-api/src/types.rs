//! Request/response DTOs for the control plane.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_payload() -> Value {
    Value::Object(serde_json::Map::new())
}

fn default_delay_sec() -> f64 {
    0.0
}

fn default_max_retries() -> u32 {
    qjobs_core::DEFAULT_MAX_RETRIES
}

fn default_backoff_sec() -> f64 {
    qjobs_core::DEFAULT_BACKOFF_SEC
}

fn default_priority() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(default = "default_payload")]
    pub payload: Value,
    #[serde(default = "default_delay_sec")]
    pub delay_sec: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_sec")]
    pub backoff_sec: f64,
    #[serde(default = "default_priority")]
    pub priority: String,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub id: String,
    pub status: String,
    pub priority: String,
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: String,
    pub attempts: u32,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub priority: String,
}

#[derive(Debug, Serialize)]
pub struct TickResponse {
    pub moved: usize,
}

#[derive(Debug, Serialize)]
pub struct QueueSizesView {
    pub high: i64,
    pub default: i64,
    pub low: i64,
    pub scheduled: i64,
    pub deadletter: i64,
}

#[derive(Debug, Serialize)]
pub struct QueuePeekView {
    pub high: Vec<String>,
    pub default: Vec<String>,
    pub low: Vec<String>,
    pub deadletter: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QueuesResponse {
    pub sizes: QueueSizesView,
    pub peek: QueuePeekView,
}

#[derive(Debug, Serialize)]
pub struct RecentJobEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub priority: String,
    pub status: String,
    pub attempts: u32,
    pub error: Option<String>,
    pub updated_at: f64,
}

#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub recent: Vec<RecentJobEntry>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
