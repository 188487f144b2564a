//! Open-for-extension registry mapping a job's `type` string to the
//! async function that executes it.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use qjobs_core::JobError;
use serde_json::Value;

pub type HandlerFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, JobError>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerFn>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    pub fn get(&self, task_type: &str) -> Option<HandlerFn> {
        self.handlers.get(task_type).cloned()
    }
}

#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<String, HandlerFn>,
}

impl HandlerRegistryBuilder {
    /// Registers a handler for `task_type`. Registering the same type
    /// twice replaces the earlier handler — callers own ordering.
    pub fn register<F, Fut>(mut self, task_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value, JobError>> + Send + 'static,
    {
        self.handlers.insert(task_type.into(), Arc::new(move |payload| Box::pin(handler(payload))));
        self
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry { handlers: self.handlers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn registered_handler_is_retrievable_by_type() {
        let registry = HandlerRegistry::builder()
            .register("echo", |payload| async move { Ok(json!({"echo": payload})) })
            .build();

        let handler = registry.get("echo").expect("echo handler should be registered");
        let result = handler(json!({"msg": "hi"})).await.unwrap();
        assert_eq!(result, json!({"echo": {"msg": "hi"}}));
        assert!(registry.get("unknown").is_none());
    }
}
