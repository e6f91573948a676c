// src/logging.rs

//! Logging setup for `mlshim` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `-v` / `-vv` (debug / trace)
//! 3. `MLSHIM_LOG` environment variable (e.g. "info", "debug")
//! 4. default to `info`
//!
//! Logs are sent to STDERR so that stdout stays usable for `versions` and
//! `debug` output.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, verbose: u8) -> Result<()> {
    let level = resolve_level(cli_level, verbose, std::env::var("MLSHIM_LOG").ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising logging: {e}"))?;

    Ok(())
}

fn resolve_level(cli_level: Option<LogLevel>, verbose: u8, env: Option<&str>) -> tracing::Level {
    if let Some(lvl) = cli_level {
        return level_from_log_level(lvl);
    }
    match verbose {
        0 => env.and_then(parse_level_str).unwrap_or(tracing::Level::INFO),
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn flag_beats_verbosity_and_env() {
        assert_eq!(resolve_level(Some(LogLevel::Warn), 2, Some("trace")), Level::WARN);
    }

    #[test]
    fn verbosity_beats_env() {
        assert_eq!(resolve_level(None, 1, Some("error")), Level::DEBUG);
        assert_eq!(resolve_level(None, 5, None), Level::TRACE);
    }

    #[test]
    fn env_then_default() {
        assert_eq!(resolve_level(None, 0, Some(" Warning ")), Level::WARN);
        assert_eq!(resolve_level(None, 0, Some("loud")), Level::INFO);
        assert_eq!(resolve_level(None, 0, None), Level::INFO);
    }
}
