// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile, TimeoutsSection};
use crate::errors::{MlshimError, Result};
use crate::monitor::MonitorOptions;
use crate::types::{CompletionPolicy, parse_duration};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = MlshimError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_matlab_section(&raw)?;
        let monitor = monitor_options(&raw.timeouts)?;
        Ok(ConfigFile::new_unchecked(raw.matlab, raw.run, monitor))
    }
}

fn validate_matlab_section(cfg: &RawConfigFile) -> Result<()> {
    if let Some(ref release) = cfg.matlab.release {
        if release.trim().is_empty() {
            return Err(MlshimError::ConfigError(
                "[matlab].release must not be empty".to_string(),
            ));
        }
        if release.contains(['/', '\\']) {
            return Err(MlshimError::ConfigError(format!(
                "[matlab].release '{release}' must be a release name, not a path"
            )));
        }
    }
    Ok(())
}

fn monitor_options(t: &TimeoutsSection) -> Result<MonitorOptions> {
    let poll_interval = positive("poll_interval", &t.poll_interval)?;
    let start_timeout = positive("start", &t.start)?;
    let completion = match t
        .completion
        .parse::<CompletionPolicy>()
        .map_err(|e| MlshimError::ConfigError(format!("[timeouts].completion: {e}")))?
    {
        CompletionPolicy::Wait(d) if d.is_zero() => {
            return Err(MlshimError::ConfigError(
                "[timeouts].completion must be > 0 (use \"none\" to not wait)".to_string(),
            ));
        }
        policy => policy,
    };
    let reap_grace = parse_duration(&t.reap_grace)
        .map_err(|e| MlshimError::ConfigError(format!("[timeouts].reap_grace: {e}")))?;

    Ok(MonitorOptions {
        poll_interval,
        start_timeout,
        completion,
        reap_grace,
    })
}

fn positive(key: &str, value: &str) -> Result<Duration> {
    let d = parse_duration(value)
        .map_err(|e| MlshimError::ConfigError(format!("[timeouts].{key}: {e}")))?;
    if d.is_zero() {
        return Err(MlshimError::ConfigError(format!(
            "[timeouts].{key} must be > 0 (got {value:?})"
        )));
    }
    Ok(d)
}
