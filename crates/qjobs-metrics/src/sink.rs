//! Write path: counters and histograms stored as Redis hashes so any
//! control-plane replica or the worker itself can render the same state.

use qjobs_core::JobResult;
use qjobs_store::{keys, StoreClient};

use crate::labels::encode;

/// Bucket boundaries paired with their exact Prometheus field-name text —
/// kept as literal pairs rather than formatted at call time so a bucket
/// like `1` never risks rendering as `1.0` and silently splitting a
/// counter across two fields.
pub const DEFAULT_BUCKETS: &[(f64, &str)] = &[
    (0.1, "0.1"),
    (0.25, "0.25"),
    (0.5, "0.5"),
    (1.0, "1"),
    (2.5, "2.5"),
    (5.0, "5"),
    (10.0, "10"),
    (30.0, "30"),
    (60.0, "60"),
    (120.0, "120"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_buckets_match_the_reference_boundaries() {
        let bounds: Vec<f64> = DEFAULT_BUCKETS.iter().map(|(b, _)| *b).collect();
        assert_eq!(bounds, vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]);
    }

    #[test]
    fn bucket_text_has_no_trailing_decimal_for_whole_numbers() {
        let one = DEFAULT_BUCKETS.iter().find(|(b, _)| *b == 1.0).unwrap();
        assert_eq!(one.1, "1");
    }
}

#[derive(Clone)]
pub struct MetricsSink {
    store: StoreClient,
}

impl MetricsSink {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    pub async fn inc_counter(&self, name: &str, labels: &[(&str, &str)], amount: f64) -> JobResult<()> {
        let key = keys::metrics_counter(name);
        let field = encode(labels);
        self.store.hincrbyfloat(&key, &field, amount).await
    }

    /// Increments every bucket the value falls in or under, plus the
    /// always-present `+Inf` bucket, and updates the running sum/count —
    /// all in the single pipelined round trip spec.md requires, matching
    /// the reference implementation's pipeline shape.
    pub async fn observe_histogram(&self, name: &str, labels: &[(&str, &str)], value: f64) -> JobResult<()> {
        let label_key = encode(labels);
        let buckets_key = keys::metrics_hist_buckets(name);
        let sum_key = keys::metrics_hist_sum(name);
        let count_key = keys::metrics_hist_count(name);

        let bucket_fields: Vec<String> = DEFAULT_BUCKETS
            .iter()
            .filter(|(bound, _)| value <= *bound)
            .map(|(_, text)| format!("{label_key}|le={text}"))
            .collect();
        let inf_field = format!("{label_key}|le=+Inf");

        self.store
            .exec_pipeline(|pipe| {
                for field in &bucket_fields {
                    pipe.hincr(&buckets_key, field, 1.0);
                }
                pipe.hincr(&buckets_key, &inf_field, 1.0);
                pipe.hincr(&sum_key, &label_key, value);
                pipe.hincr(&count_key, &label_key, 1.0);
            })
            .await
    }
}
