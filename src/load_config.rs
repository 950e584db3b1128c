use crate::config::Config;
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Loads a static YAML config file (no secrets) and injects the optional token from the
/// environment. Without a file, every setting takes its default.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config> {
    let mut config = match path {
        Some(path) => read_config_file(path.as_ref())?,
        None => {
            info!("No config file given, using defaults");
            Config::default()
        }
    };

    config.github.token = match std::env::var(TOKEN_ENV_VAR) {
        Ok(token) if !token.trim().is_empty() => {
            info!("{TOKEN_ENV_VAR} found in env");
            Some(token.trim().to_string())
        }
        _ => {
            info!("{TOKEN_ENV_VAR} not set, continuing unauthenticated");
            None
        }
    };

    if config.ingest.concurrency == 0 {
        error!("ingest.concurrency must be at least 1");
        anyhow::bail!("Invalid config: ingest.concurrency must be at least 1");
    }
    if config.github.timeout_secs == 0 {
        error!("github.timeout_secs must be at least 1");
        anyhow::bail!("Invalid config: github.timeout_secs must be at least 1");
    }

    config.trace_loaded();
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    info!(config_path = ?path, "Loading configuration from file");

    let config_content = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    // An empty file is a valid, all-defaults config.
    if config_content.trim().is_empty() {
        return Ok(Config::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}
