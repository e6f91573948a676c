// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::monitor::MonitorOptions;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [matlab]
/// base = "C:/Program Files/MATLAB"
/// release = "R2016b"
///
/// [run]
/// working_directory = "build"
///
/// [timeouts]
/// poll_interval = "5s"
/// start = "60s"
/// completion = "720s"   # or "none" to not wait for MATLAB to finish
/// reap_grace = "10s"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub matlab: MatlabSection,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub timeouts: TimeoutsSection,
}

/// `[matlab]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MatlabSection {
    /// Directory holding one folder per installed release.
    ///
    /// If `None`, the platform default install location is used.
    #[serde(default)]
    pub base: Option<PathBuf>,

    /// Release to run (e.g. `"R2016b"`).
    ///
    /// If `None`, the newest installed release is picked.
    #[serde(default)]
    pub release: Option<String>,
}

/// `[run]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RunSection {
    /// Where the script and log are written and where MATLAB `cd`s to.
    ///
    /// If `None`, the current directory.
    #[serde(default)]
    pub working_directory: Option<PathBuf>,

    /// MATLAB preferences directory (`MATLAB_PREFDIR`).
    ///
    /// If `None`, a fresh `prefs_<uuid>` folder in the working directory.
    #[serde(default)]
    pub pref_dir: Option<PathBuf>,
}

/// `[timeouts]` section. Durations are strings like `"250ms"`, `"5s"`, `"2m"`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TimeoutsSection {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Budget for MATLAB to create its log and print `Started`.
    #[serde(default = "default_start")]
    pub start: String,

    /// Budget for the script after it started, or `"none"`.
    #[serde(default = "default_completion")]
    pub completion: String,

    /// How long MATLAB may take to exit after reporting a result.
    #[serde(default = "default_reap_grace")]
    pub reap_grace: String,
}

fn default_poll_interval() -> String {
    "5s".to_string()
}

fn default_start() -> String {
    "60s".to_string()
}

fn default_completion() -> String {
    "720s".to_string()
}

fn default_reap_grace() -> String {
    "10s".to_string()
}

impl Default for TimeoutsSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            start: default_start(),
            completion: default_completion(),
            reap_grace: default_reap_grace(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on the timeouts being parsed and non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub matlab: MatlabSection,
    pub run: RunSection,
    pub monitor: MonitorOptions,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        matlab: MatlabSection,
        run: RunSection,
        monitor: MonitorOptions,
    ) -> Self {
        Self {
            matlab,
            run,
            monitor,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            MatlabSection::default(),
            RunSection::default(),
            MonitorOptions::default(),
        )
    }
}
