//! The job record: the hash persisted at `job:<id>` and the in-memory
//! type workers and the control plane exchange.

use std::collections::HashMap;

use qjobs_core::{JobId, JobStatus, Priority, DEFAULT_BACKOFF_SEC, DEFAULT_MAX_RETRIES};
use serde_json::Value;

use crate::time::now_secs;

/// A single unit of work: what to run, how far along it is, and how to
/// retry it if it fails.
///
/// Every field round-trips through a Redis hash field via
/// [`encode_value`]/[`parse_value`] — structured values (`payload`,
/// `result`, `tags`) are stored as JSON text, scalars as bare strings, and
/// `None` is stored as the literal text `"null"` so a present-but-empty
/// field is distinguishable from an absent one after a partial write.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub job_type: String,
    pub payload: Value,
    pub status: JobStatus,
    pub attempts: u32,
    pub max_retries: u32,
    pub backoff_sec: f64,
    pub next_run_at: Option<f64>,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub priority: Priority,
    pub created_at: f64,
    pub updated_at: f64,
}

/// Producer-supplied fields for a new job, before defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub job_type: String,
    pub payload: Value,
    pub delay_sec: f64,
    pub max_retries: Option<u32>,
    pub backoff_sec: Option<f64>,
    pub priority: Option<Priority>,
}

impl Job {
    /// Builds a new, unqueued job record from producer input. Status and
    /// `next_run_at` are NOT set here — [`crate::engine::QueueEngine::enqueue`]
    /// decides those based on `delay_sec`, matching the save-then-index
    /// ordering the store relies on.
    pub fn from_new(new: NewJob) -> Self {
        let now = now_secs();
        Self {
            id: JobId::new(),
            job_type: new.job_type,
            payload: new.payload,
            status: JobStatus::Queued,
            attempts: 0,
            max_retries: new.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            backoff_sec: new.backoff_sec.unwrap_or(DEFAULT_BACKOFF_SEC),
            next_run_at: None,
            result: None,
            error: None,
            priority: new.priority.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this job has exhausted its retry budget.
    pub fn is_exhausted(&self) -> bool {
        self.attempts > self.max_retries
    }

    /// Encodes the record as the field map written to `job:<id>`.
    pub fn to_fields(&self) -> HashMap<String, String> {
        let mut m = HashMap::new();
        m.insert("id".into(), self.id.as_str());
        m.insert("type".into(), self.job_type.clone());
        m.insert("payload".into(), encode_value(Some(&self.payload)));
        m.insert("status".into(), self.status.as_str().into());
        m.insert("attempts".into(), self.attempts.to_string());
        m.insert("max_retries".into(), self.max_retries.to_string());
        m.insert("backoff_sec".into(), self.backoff_sec.to_string());
        m.insert(
            "next_run_at".into(),
            self.next_run_at.map(|v| v.to_string()).unwrap_or_else(|| "null".into()),
        );
        m.insert("result".into(), encode_value(self.result.as_ref()));
        m.insert(
            "error".into(),
            self.error.clone().unwrap_or_else(|| "null".into()),
        );
        m.insert("priority".into(), self.priority.as_str().into());
        m.insert("created_at".into(), self.created_at.to_string());
        m.insert("updated_at".into(), self.updated_at.to_string());
        m
    }

    /// Decodes a record from the field map read back from `job:<id>`,
    /// applying the same defaults the store's loader applies to fields
    /// missing from a partially-written or legacy hash.
    pub fn from_fields(id: JobId, fields: &HashMap<String, String>) -> Self {
        let now = now_secs();
        let job_type = fields.get("type").cloned().unwrap_or_default();
        let payload = fields
            .get("payload")
            .and_then(|v| parse_value(v))
            .unwrap_or(Value::Null);
        let status = fields
            .get("status")
            .and_then(|s| JobStatus::parse(s))
            .unwrap_or(JobStatus::Queued);
        let attempts = fields
            .get("attempts")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let max_retries = fields
            .get("max_retries")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let backoff_sec = fields
            .get("backoff_sec")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_BACKOFF_SEC);
        let next_run_at = fields.get("next_run_at").and_then(|v| {
            if v == "null" { None } else { v.parse().ok() }
        });
        let result = fields.get("result").and_then(|v| parse_value(v));
        let error = fields.get("error").and_then(|v| {
            if v == "null" { None } else { Some(v.clone()) }
        });
        let priority = fields
            .get("priority")
            .and_then(|p| Priority::parse(p))
            .unwrap_or_default();
        let created_at = fields
            .get("created_at")
            .and_then(|v| v.parse().ok())
            .unwrap_or(now);
        let updated_at = fields
            .get("updated_at")
            .and_then(|v| v.parse().ok())
            .unwrap_or(now);

        Self {
            id,
            job_type,
            payload,
            status,
            attempts,
            max_retries,
            backoff_sec,
            next_run_at,
            result,
            error,
            priority,
            created_at,
            updated_at,
        }
    }
}

/// `None` encodes as the JSON-null literal text; objects/arrays encode as
/// JSON text; everything else round-trips as its own string form via
/// `to_string`, since `Job`'s structured fields are always `Value`.
pub fn encode_value(value: Option<&Value>) -> String {
    match value {
        None => "null".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(v @ (Value::Object(_) | Value::Array(_))) => v.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
    }
}

/// Best-effort decode of a hash field back into a `Value`: try JSON first
/// (covers objects/arrays/numbers/bools), falling back to a bare string.
/// Returns `None` only for the literal `"null"` marker.
pub fn parse_value(raw: &str) -> Option<Value> {
    if raw == "null" {
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(v) => Some(v),
        Err(_) => Some(Value::String(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_job_applies_defaults() {
        let job = Job::from_new(NewJob {
            job_type: "echo".into(),
            payload: json!({"msg": "hi"}),
            ..Default::default()
        });
        assert_eq!(job.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(job.backoff_sec, DEFAULT_BACKOFF_SEC);
        assert_eq!(job.priority, Priority::Default);
        assert_eq!(job.attempts, 0);
    }

    #[test]
    fn field_round_trip_preserves_structured_payload() {
        let job = Job::from_new(NewJob {
            job_type: "sleep".into(),
            payload: json!({"seconds": 2}),
            priority: Some(Priority::High),
            ..Default::default()
        });
        let fields = job.to_fields();
        let restored = Job::from_fields(job.id, &fields);
        assert_eq!(restored.payload, job.payload);
        assert_eq!(restored.priority, Priority::High);
        assert_eq!(restored.job_type, "sleep");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let fields = HashMap::new();
        let restored = Job::from_fields(JobId::new(), &fields);
        assert_eq!(restored.priority, Priority::Default);
        assert_eq!(restored.attempts, 0);
        assert_eq!(restored.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(restored.next_run_at, None);
    }

    #[test]
    fn encode_value_marks_absent_as_null_literal() {
        assert_eq!(encode_value(None), "null");
        assert_eq!(parse_value("null"), None);
    }

    #[test]
    fn is_exhausted_true_only_past_max_retries() {
        let mut job = Job::from_new(NewJob {
            job_type: "echo".into(),
            max_retries: Some(2),
            ..Default::default()
        });
        job.attempts = 2;
        assert!(!job.is_exhausted());
        job.attempts = 3;
        assert!(job.is_exhausted());
    }
}
