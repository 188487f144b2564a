//! Store-backed metrics: counters and histograms live in Redis hashes
//! rather than a process-local registry, so any replica can render the
//! same `/metrics` text.

pub mod labels;
pub mod names;
pub mod render;
pub mod sink;

pub use render::render_prometheus;
pub use sink::{MetricsSink, DEFAULT_BUCKETS};
