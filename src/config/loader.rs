// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** parse or check
/// the timeout values. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the raw config if the file exists, defaults otherwise.
///
/// Callers layer CLI overrides on top of the raw values and validate once.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    if path.is_file() {
        debug!(config = %path.display(), "loading config file");
        load_from_path(path)
    } else {
        debug!(config = %path.display(), "no config file; using defaults");
        Ok(RawConfigFile::default())
    }
}

/// `Mlshim.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Mlshim.toml")
}
