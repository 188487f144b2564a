//! Job queue control plane entry point.
//!
//! Runs the HTTP control plane (`qjobs-api`) and, if `worker.embedded` is
//! set, an in-process worker loop alongside it. Horizontal scaling is
//! still "run more worker processes" — see SPEC_FULL.md §5 — this flag
//! exists for single-binary demos, not as the intended production shape.

use qjobs_config::ConfigLoader;
use qjobs_engine::QueueEngine;
use qjobs_metrics::MetricsSink;
use qjobs_store::StoreClient;
use qjobs_worker::Worker;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    init_logging();

    info!(version = env!("CARGO_PKG_VERSION"), "starting job queue server");

    if let Err(e) = run().await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}

async fn run() -> qjobs_core::JobResult<()> {
    let config = ConfigLoader::from_default_location().unwrap_or_else(|e| {
        info!(error = %e, "no config files found, using defaults");
        qjobs_config::AppConfig {
            server: Default::default(),
            store: Default::default(),
            worker: Default::default(),
        }
    });

    let store = StoreClient::connect(&config.store.url, config.store.pool_size).await?;
    let engine = QueueEngine::new(store.clone());
    let metrics = MetricsSink::new(store.clone());

    let state = qjobs_api::AppState::new(store, engine.clone(), metrics.clone());
    let router = qjobs_api::router(state);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let worker_task = if config.worker.embedded {
        info!("embedded worker loop enabled");
        let handlers = qjobs_worker::builtin_registry().build();
        let worker = Worker::new(engine, metrics, handlers);
        let rx = shutdown_rx.clone();
        Some(tokio::spawn(async move { worker.run(rx).await }))
    } else {
        None
    };

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr())
        .await
        .map_err(|e| qjobs_core::JobError::Validation(format!("failed to bind {}: {e}", config.server.bind_addr())))?;
    info!(addr = %config.server.bind_addr(), "control plane listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| qjobs_core::JobError::Validation(format!("server error: {e}")))?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = worker_task {
        let _ = task.await;
    }

    info!("server shutdown complete");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,qjobs=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received ctrl+c, shutting down");
        }
        _ = terminate => {
            info!("received terminate signal, shutting down");
        }
    }
}
