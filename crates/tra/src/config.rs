//! Engine configuration loading.
//!
//! The configuration is a JSON document in the shape of [`EngineConfig`];
//! missing keys take their defaults. It is validated once here and treated
//! as read-only for the rest of the process.

use std::path::{Path, PathBuf};
use tracing::info;
use tra_core::EngineConfig;

use crate::error::Result;

/// Environment variable naming the default configuration file
pub const CONFIG_ENV: &str = "TRA_CONFIG";

/// Path from `TRA_CONFIG`, if set and non-empty
pub fn env_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Load and validate a configuration file, or the defaults when `path` is `None`.
pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    let config = EngineConfig::from_json(&text)?;
    info!(path = %path.display(), "loaded engine configuration");
    Ok(config)
}
