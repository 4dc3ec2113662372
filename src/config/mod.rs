//! Estimator configuration and configuration-file loading

mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

pub use settings::{
    ChromaMethodConfig, ConfigError, EstimatorConfig, FrequencyConfig, KeyConfig, OnsetMethod,
    OnsetMethodConfig, TempoConfig,
};

/// `<config dir>/beatkey/config.json`, if the platform has a config dir
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("beatkey").join("config.json"))
}

/// Read and validate a JSON configuration file
pub fn load_file(path: &Path) -> Result<EstimatorConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: EstimatorConfig = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Resolve the configuration for a run
///
/// An explicit path must exist. Without one, the per-user file is used
/// when present, and the built-in defaults otherwise.
pub fn load(explicit: Option<&Path>) -> Result<EstimatorConfig> {
    if let Some(path) = explicit {
        debug!("loading config from {}", path.display());
        return load_file(path);
    }

    match default_path() {
        Some(path) if path.is_file() => {
            debug!("loading config from {}", path.display());
            load_file(&path)
        }
        _ => Ok(EstimatorConfig::default()),
    }
}
