mod types;

pub use types::*;

use crate::Result;
use std::{env, path::Path};
use tracing::debug;

pub const TOKEN_ENV: &str = "HF_TOKEN";
pub const MODEL_ENV: &str = "HF_MODEL";

/// Loads the config file (if present) and applies environment overrides.
pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    let config = load_from_path(&config_path).await?;
    Ok(apply_env(config, |key| env::var(key).ok()))
}

/// Reads a YAML config file. A missing file yields the built-in defaults.
pub async fn load_from_path(config_path: impl AsRef<Path>) -> Result<Config> {
    let config_path = config_path.as_ref();

    if !tokio::fs::try_exists(config_path).await? {
        debug!(
            "No configuration file at {}, using defaults",
            config_path.display()
        );
        return Ok(Config::default());
    }

    debug!("Loading configuration from: {}", config_path.display());

    let config_str = tokio::fs::read_to_string(config_path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;

    Ok(config)
}

/// Overlays `HF_TOKEN` and `HF_MODEL` on top of a loaded config.
pub fn apply_env(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(token) = lookup(TOKEN_ENV).filter(|token| !token.trim().is_empty()) {
        config.upstream.api_token = Some(token);
    }

    if let Some(model) = lookup(MODEL_ENV).filter(|model| !model.trim().is_empty()) {
        config.upstream.model = model;
    }

    config
}
