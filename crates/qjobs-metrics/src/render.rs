//! Read path: walks the counter and histogram keys in the store and
//! renders them as Prometheus text exposition format.

use std::collections::BTreeMap;

use qjobs_core::{JobResult, Priority};
use qjobs_engine::QueueEngine;
use qjobs_store::{keys, StoreClient};

use crate::labels::{decode, prom_kv};
use crate::names;

/// Renders every stored counter and histogram, plus point-in-time queue
/// depth gauges and a build-info line, as `text/plain` Prometheus
/// exposition format.
pub async fn render_prometheus(store: &StoreClient, engine: &QueueEngine, version: &str) -> JobResult<String> {
    let mut lines = Vec::new();

    render_gauges(engine, version, &mut lines).await?;
    render_counters(store, &mut lines).await?;
    render_histograms(store, &mut lines).await?;

    lines.push(String::new());
    Ok(lines.join("\n"))
}

async fn render_gauges(engine: &QueueEngine, version: &str, lines: &mut Vec<String>) -> JobResult<()> {
    let sizes = engine.queue_sizes().await?;

    lines.push(format!("# TYPE {} gauge", names::QUEUE_SIZE));
    for (priority, size) in [
        (Priority::High, sizes.high),
        (Priority::Default, sizes.default),
        (Priority::Low, sizes.low),
    ] {
        lines.push(format!(
            "{}{} {}",
            names::QUEUE_SIZE,
            prom_kv(&[("priority", priority.as_str())]),
            size
        ));
    }

    lines.push(format!("# TYPE {} gauge", names::QUEUE_SCHEDULED));
    lines.push(format!("{} {}", names::QUEUE_SCHEDULED, sizes.scheduled));

    lines.push(format!("# TYPE {} gauge", names::QUEUE_DEADLETTER));
    lines.push(format!("{} {}", names::QUEUE_DEADLETTER, sizes.deadletter));

    lines.push(format!("# TYPE {} gauge", names::BUILD_INFO));
    lines.push(format!("{}{} 1", names::BUILD_INFO, prom_kv(&[("version", version)])));

    Ok(())
}

async fn render_counters(store: &StoreClient, lines: &mut Vec<String>) -> JobResult<()> {
    let mut counter_keys = store.keys("metrics:counter:*").await?;
    counter_keys.sort();

    for key in counter_keys {
        let Some(name) = key.strip_prefix("metrics:counter:") else { continue };
        let items = store.hgetall(&key).await?;
        lines.push(format!("# TYPE {name} counter"));

        let mut sorted: Vec<_> = items.into_iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        for (field, value) in sorted {
            let labels = decode(&field);
            let label_refs: Vec<(&str, &str)> = labels.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            lines.push(format!("{name}{} {value}", prom_kv(&label_refs)));
        }
    }
    Ok(())
}

async fn render_histograms(store: &StoreClient, lines: &mut Vec<String>) -> JobResult<()> {
    let mut bucket_keys = store.keys("metrics:hist:*:buckets").await?;
    bucket_keys.sort();

    for buck_key in bucket_keys {
        let Some(rest) = buck_key.strip_prefix("metrics:hist:") else { continue };
        let Some(name) = rest.strip_suffix(":buckets") else { continue };

        let sum_key = keys::metrics_hist_sum(name);
        let count_key = keys::metrics_hist_count(name);

        let buckets = store.hgetall(&buck_key).await?;
        let sums = store.hgetall(&sum_key).await?;
        let counts = store.hgetall(&count_key).await?;

        lines.push(format!("# TYPE {name}_bucket histogram"));

        // Group bucket fields ("<label_key>|le=<bound>") by their label key.
        let mut groups: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for (field, count) in &buckets {
            if let Some((base, le)) = field.split_once("|le=") {
                let value: f64 = count.parse().unwrap_or(0.0);
                groups.entry(base.to_string()).or_default().insert(le.to_string(), value);
            }
        }

        for (base, le_map) in groups {
            let base_labels = decode(&base);
            let base_refs: Vec<(&str, &str)> = base_labels.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

            let mut numeric_bounds: Vec<f64> = le_map
                .keys()
                .filter(|k| *k != "+Inf")
                .filter_map(|k| k.parse().ok())
                .collect();
            numeric_bounds.sort_by(|a, b| a.partial_cmp(b).unwrap());

            for bound in numeric_bounds {
                let bound_text = crate::sink::DEFAULT_BUCKETS
                    .iter()
                    .find(|(b, _)| (*b - bound).abs() < f64::EPSILON)
                    .map(|(_, text)| text.to_string())
                    .unwrap_or_else(|| bound.to_string());
                let mut out = base_refs.clone();
                out.push(("le", bound_text.as_str()));
                let value = le_map.get(&bound_text).copied().unwrap_or(0.0);
                lines.push(format!("{name}_bucket{} {value}", prom_kv(&out)));
            }

            let mut inf_labels = base_refs.clone();
            inf_labels.push(("le", "+Inf"));
            let inf_value = le_map.get("+Inf").copied().unwrap_or(0.0);
            lines.push(format!("{name}_bucket{} {inf_value}", prom_kv(&inf_labels)));

            let total_count: f64 = counts.get(&base).and_then(|v| v.parse().ok()).unwrap_or(0.0);
            let total_sum: f64 = sums.get(&base).and_then(|v| v.parse().ok()).unwrap_or(0.0);
            lines.push(format!("# TYPE {name}_count counter"));
            lines.push(format!("{name}_count{} {total_count}", prom_kv(&base_refs)));
            lines.push(format!("# TYPE {name}_sum counter"));
            lines.push(format!("{name}_sum{} {total_sum}", prom_kv(&base_refs)));
        }
    }
    Ok(())
}
