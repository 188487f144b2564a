//! Built-in task handlers, matching the two task types spec.md's HTTP
//! contract accepts.

use std::time::Duration;

use qjobs_core::JobError;
use serde_json::{json, Value};

use crate::handler::HandlerRegistryBuilder;

pub async fn handle_echo(payload: Value) -> Result<Value, JobError> {
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(json!({ "echo": payload }))
}

pub async fn handle_sleep(payload: Value) -> Result<Value, JobError> {
    let seconds = payload.get("seconds").and_then(Value::as_f64).unwrap_or(1.0);
    tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
    Ok(json!({ "slept": seconds }))
}

/// A registry pre-populated with `echo` and `sleep`. Callers can chain
/// further `.register(...)` calls before `.build()` to extend it.
pub fn builtin_registry() -> HandlerRegistryBuilder {
    HandlerRegistryBuilder::default()
        .register("echo", handle_echo)
        .register("sleep", handle_sleep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn echo_returns_payload_under_echo_key() {
        let result = handle_echo(json!({"msg": "hi"})).await.unwrap();
        assert_eq!(result, json!({"echo": {"msg": "hi"}}));
    }

    #[tokio::test]
    async fn sleep_defaults_to_one_second_when_unspecified() {
        let result = handle_sleep(json!({})).await.unwrap();
        assert_eq!(result, json!({"slept": 1.0}));
    }
}
