// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

use crate::monitor::MonitorError;

#[derive(Error, Debug)]
pub enum MlshimError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("MATLAB executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("No MATLAB installations found under {}", .0.display())]
    NoInstalledVersions(PathBuf),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MlshimError {
    /// Process exit code for this error.
    ///
    /// Monitor failures keep their per-kind codes; Ctrl-C is `130`;
    /// everything else is `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            MlshimError::Monitor(err) => err.exit_code(),
            MlshimError::Interrupted => 130,
            _ => 1,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MlshimError>;
