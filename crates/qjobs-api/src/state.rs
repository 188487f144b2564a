//! Shared Axum application state.

use std::sync::Arc;

use qjobs_engine::QueueEngine;
use qjobs_metrics::MetricsSink;
use qjobs_store::StoreClient;

#[derive(Clone)]
pub struct AppState {
    pub store: StoreClient,
    pub engine: Arc<QueueEngine>,
    pub metrics: Arc<MetricsSink>,
    pub version: &'static str,
}

impl AppState {
    pub fn new(store: StoreClient, engine: QueueEngine, metrics: MetricsSink) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
            metrics: Arc::new(metrics),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
