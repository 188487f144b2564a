//! Layered configuration loading: `config/default.toml`, then
//! `config/{QJOBS_ENV}.toml`, then `config/local.toml`, then environment
//! variables, in increasing priority.

use std::path::Path;

use config::{Config, Environment, File};
use qjobs_core::{JobError, JobResult};
use tracing::{debug, info};

use crate::app_config::AppConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from `config_dir`, applying the `REDIS_URL`
    /// environment variable as a final override on top of everything
    /// else — the reference worker/producer/bench tooling this system
    /// replaces all read that exact variable name, so it takes priority
    /// over the `QJOBS__STORE__URL` form the generic env layer expects.
    pub fn load(config_dir: &str) -> JobResult<AppConfig> {
        if let Err(e) = dotenvy::dotenv() {
            debug!(error = %e, "no .env file found");
        }

        let environment = std::env::var("QJOBS_ENV").unwrap_or_else(|_| "development".to_string());
        info!(environment = %environment, "loading job queue configuration");

        let mut builder = Config::builder();

        for candidate in [
            format!("{config_dir}/default.toml"),
            format!("{config_dir}/{environment}.toml"),
            format!("{config_dir}/local.toml"),
        ] {
            if Path::new(&candidate).exists() {
                debug!(path = %candidate, "loading config file");
                builder = builder.add_source(File::with_name(&candidate).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("QJOBS").separator("__").try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| JobError::Validation(format!("failed to build config: {e}")))?;

        let mut app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| JobError::Validation(format!("failed to parse config: {e}")))?;

        if let Ok(redis_url) = std::env::var("REDIS_URL") {
            app_config.store.url = redis_url;
        }

        Ok(app_config)
    }

    pub fn from_default_location() -> JobResult<AppConfig> {
        Self::load("./config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn redis_url_env_var_overrides_file_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[store]\nurl = \"redis://file-configured:6379/0\"").unwrap();

        std::env::set_var("REDIS_URL", "redis://env-override:6379/0");
        let config = ConfigLoader::load(dir.path().to_str().unwrap()).unwrap();
        std::env::remove_var("REDIS_URL");

        assert_eq!(config.store.url, "redis://env-override:6379/0");
    }

    #[test]
    fn missing_config_dir_still_produces_defaults() {
        std::env::remove_var("REDIS_URL");
        let config = ConfigLoader::load("./this-directory-does-not-exist").unwrap();
        assert_eq!(config.server.port, 8000);
    }
}
