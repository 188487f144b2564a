//! Configuration management for the job queue.

mod app_config;
mod loader;

pub use app_config::{AppConfig, ServerConfig, StoreConfig, WorkerConfig};
pub use loader::ConfigLoader;
