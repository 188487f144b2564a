//! Typed configuration tree.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { url: default_redis_url(), pool_size: default_pool_size() }
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}

fn default_pool_size() -> usize {
    16
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether `qjobs-server` should also run the worker loop in-process,
    /// alongside the HTTP control plane. See SPEC_FULL.md §5.
    #[serde(default)]
    pub embedded: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { embedded: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_default_bind_addr() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8000");
    }
}
