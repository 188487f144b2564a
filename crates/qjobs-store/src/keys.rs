//! Store key names. Fixed, not prefix-configurable: the HTTP control
//! plane, the worker, and `demos/bench` all agree on these exact names,
//! so operators can inspect the store directly while debugging.

use qjobs_core::Priority;

pub fn queue(priority: Priority) -> String {
    format!("queue:{}", priority.as_str())
}

pub const SCHEDULED: &str = "queue:scheduled";
pub const DEAD_LETTER: &str = "queue:deadletter";

pub fn job(id: &str) -> String {
    format!("job:{id}")
}

pub fn metrics_counter(name: &str) -> String {
    format!("metrics:counter:{name}")
}

pub fn metrics_hist_buckets(name: &str) -> String {
    format!("metrics:hist:{name}:buckets")
}

pub fn metrics_hist_sum(name: &str) -> String {
    format!("metrics:hist:{name}:sum")
}

pub fn metrics_hist_count(name: &str) -> String {
    format!("metrics:hist:{name}:count")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_queue_keys_match_wire_contract() {
        assert_eq!(queue(Priority::High), "queue:high");
        assert_eq!(queue(Priority::Default), "queue:default");
        assert_eq!(queue(Priority::Low), "queue:low");
    }

    #[test]
    fn job_key_formatting() {
        assert_eq!(job("abc-123"), "job:abc-123");
    }

    #[test]
    fn metrics_key_formatting() {
        assert_eq!(metrics_counter("job_queue_enqueued_total"), "metrics:counter:job_queue_enqueued_total");
        assert_eq!(metrics_hist_buckets("job_queue_latency_seconds"), "metrics:hist:job_queue_latency_seconds:buckets");
    }
}
