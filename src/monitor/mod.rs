// src/monitor/mod.rs

//! Process lifecycle monitor.
//!
//! Launches MATLAB (or anything that behaves like it) and decides the outcome
//! of the run purely from the sentinel lines that show up in its log file.
//! The process exit code is never consulted.
//!
//! The pure state machine lives in [`core`]; the blocking poll loop that
//! spawns, reads and sleeps is in [`runner`]; sentinel matching is in
//! [`log`].

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;

use crate::types::{CompletionPolicy, Phase};

pub mod core;
pub mod log;
pub mod runner;

pub use self::core::{Disposal, MonitorCore, Observation, Step, Verdict};
pub use self::log::{FAILED, FINISHED, LICENSE_ERROR, LogScan, STARTED};
pub use self::runner::{Monitor, run};

/// Timing knobs for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Sleep between two looks at the log.
    pub poll_interval: Duration,
    /// Budget for the log to appear and for `Started` to show up, measured
    /// from launch.
    pub start_timeout: Duration,
    /// Whether, and for how long, to wait for `Finished` / `Failed`.
    pub completion: CompletionPolicy,
    /// How long a process that reported a result may take to exit on its own.
    pub reap_grace: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            start_timeout: Duration::from_secs(60),
            completion: CompletionPolicy::default(),
            reap_grace: Duration::from_secs(10),
        }
    }
}

/// Shared stop signal for runs in progress.
///
/// Clones observe the same flag. The poll loop checks it between looks at
/// the log and kills the child once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Successful run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// `Succeeded` or `Detached`.
    pub phase: Phase,
    pub pid: Option<u32>,
    /// Time from launch to the verdict.
    pub elapsed: Duration,
    pub log_path: PathBuf,
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("command is empty")]
    EmptyCommand,

    #[error("log directory does not exist: {}", .0.display())]
    LogDirectoryMissing(PathBuf),

    #[error("failed to spawn '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("log file {} was not created within {timeout:?}", .log.display())]
    LogCreationTimeout { log: PathBuf, timeout: Duration },

    #[error("MATLAB did not start the script within {timeout:?} (log {})", .log.display())]
    StartTimeout { log: PathBuf, timeout: Duration },

    #[error("MATLAB execution did not finish within {timeout:?} (log {})", .log.display())]
    ExecutionTimeout { log: PathBuf, timeout: Duration },

    #[error("MATLAB processing failed (log {})", .log.display())]
    ExecutionFailed { log: PathBuf },

    #[error("MATLAB could not check out a license (log {})", .log.display())]
    LicenseError { log: PathBuf },

    #[error("MATLAB run cancelled (log {})", .log.display())]
    Cancelled { log: PathBuf },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl MonitorError {
    /// Distinct process exit code per failure kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            MonitorError::LogCreationTimeout { .. } => 2,
            MonitorError::StartTimeout { .. } => 3,
            MonitorError::ExecutionTimeout { .. } => 4,
            MonitorError::ExecutionFailed { .. } => 5,
            MonitorError::LicenseError { .. } => 6,
            MonitorError::Cancelled { .. } => 130,
            MonitorError::EmptyCommand
            | MonitorError::LogDirectoryMissing(_)
            | MonitorError::Spawn { .. }
            | MonitorError::Io(_) => 1,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            MonitorError::LogCreationTimeout { .. }
                | MonitorError::StartTimeout { .. }
                | MonitorError::ExecutionTimeout { .. }
        )
    }
}
