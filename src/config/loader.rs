// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawConfigFile, RunnerConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] to also
/// run the semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RunnerConfig> {
    let raw_config = load_from_path(&path)?;
    let config = RunnerConfig::try_from(raw_config)?;
    Ok(config)
}

impl RunnerConfig {
    /// Parse and validate configuration from an in-memory TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw: RawConfigFile = toml::from_str(contents)?;
        RunnerConfig::try_from(raw)
    }
}

/// Conventional config location: `Dagrun.toml` in the current directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dagrun.toml")
}
