// src/monitor/runner.rs

//! Blocking IO shell around [`MonitorCore`].

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::exec::{ChildHandle, LaunchSpec, ProcessLauncher, RealLauncher};
use crate::fs::{FileSystem, RealFileSystem};
use crate::monitor::core::{Disposal, MonitorCore, Observation, Step, Verdict};
use crate::monitor::log::LogScan;
use crate::monitor::{CancelToken, MonitorError, MonitorOptions, RunReport};
use crate::types::{CompletionPolicy, Phase};

/// Longest stretch the poll loop sleeps without checking for cancellation.
const CANCEL_CHECK: Duration = Duration::from_millis(50);

/// Launch `command` with the real process launcher and watch `log_path`.
///
/// Convenience wrapper over [`Monitor::run`] using the default poll interval
/// and reap grace.
pub fn run(
    command: &[String],
    log_path: &Path,
    start_timeout: Duration,
    completion: CompletionPolicy,
) -> Result<RunReport, MonitorError> {
    let spec = LaunchSpec::from_command(command).map_err(|_| MonitorError::EmptyCommand)?;
    let options = MonitorOptions {
        start_timeout,
        completion,
        ..MonitorOptions::default()
    };
    Monitor::new(RealLauncher, RealFileSystem, options).run(&spec, log_path)
}

/// Drives one or more runs, one at a time per call.
///
/// A `Monitor` holds no per-run state, so a single instance can be shared by
/// several threads, each calling [`Monitor::run`] with its own log path.
/// Cancelling its [`CancelToken`] stops every run it is driving.
#[derive(Debug, Clone)]
pub struct Monitor<L, F> {
    launcher: L,
    fs: F,
    options: MonitorOptions,
    cancel: CancelToken,
}

/// One external-process execution: the child it owns and where it stands.
struct Run<'a> {
    log_path: &'a Path,
    launched: Instant,
    completion: CompletionPolicy,
    child: Box<dyn ChildHandle>,
    core: MonitorCore,
}

impl<L, F> Monitor<L, F>
where
    L: ProcessLauncher,
    F: FileSystem,
{
    pub fn new(launcher: L, fs: F, options: MonitorOptions) -> Self {
        Self {
            launcher,
            fs,
            options,
            cancel: CancelToken::new(),
        }
    }

    /// Handle that stops in-flight runs from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Start the process described by `spec` and block until its log shows a
    /// result or a timeout expires.
    ///
    /// Any file already at `log_path` is deleted before launch.
    pub fn run(&self, spec: &LaunchSpec, log_path: &Path) -> Result<RunReport, MonitorError> {
        self.run_with(spec, log_path, self.options.completion)
    }

    /// Like [`Monitor::run`], overriding the configured completion policy.
    pub fn run_with(
        &self,
        spec: &LaunchSpec,
        log_path: &Path,
        completion: CompletionPolicy,
    ) -> Result<RunReport, MonitorError> {
        self.prepare(spec, log_path)?;

        let child = self.launcher.spawn(spec).map_err(|e| MonitorError::Spawn {
            program: spec.program.clone(),
            reason: format!("{e:#}"),
        })?;

        let mut run = Run {
            log_path,
            launched: Instant::now(),
            child,
            completion,
            core: MonitorCore::new(self.options.start_timeout, completion),
        };
        let pid = run.child.id();
        info!(pid, log = %log_path.display(), "waiting for MATLAB log");

        let verdict = self.poll_until_verdict(&mut run);
        let elapsed = run.launched.elapsed();
        self.dispose(&mut run, verdict);

        match verdict {
            Verdict::Succeeded | Verdict::Detached => {
                info!(
                    pid,
                    phase = %verdict.phase(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "MATLAB run complete"
                );
                Ok(RunReport {
                    phase: verdict.phase(),
                    pid,
                    elapsed,
                    log_path: log_path.to_path_buf(),
                })
            }
            failure => Err(self.failure(failure, &run)),
        }
    }

    fn prepare(&self, spec: &LaunchSpec, log_path: &Path) -> Result<(), MonitorError> {
        if spec.program.is_empty() {
            return Err(MonitorError::EmptyCommand);
        }

        let dir = match log_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !self.fs.is_dir(&dir) {
            return Err(MonitorError::LogDirectoryMissing(dir));
        }

        if self.fs.exists(log_path) {
            debug!(log = %log_path.display(), "removing stale log from a previous run");
            self.fs
                .remove_file(log_path)
                .context("removing stale log file")?;
        }
        Ok(())
    }

    fn poll_until_verdict(&self, run: &mut Run<'_>) -> Verdict {
        loop {
            if self.cancel.is_cancelled() {
                if let Step::Finish(verdict) = run.core.cancel() {
                    return verdict;
                }
            }
            let elapsed = run.launched.elapsed();
            let before = run.core.phase();
            let observation = self.observe(run.log_path, before);

            match run.core.observe(observation, elapsed) {
                Step::Finish(verdict) => {
                    debug!(
                        phases = ?run.core.history(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "verdict reached"
                    );
                    return verdict;
                }
                Step::Poll => {
                    let phase = run.core.phase();
                    if phase != before {
                        info!(
                            %phase,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "phase changed"
                        );
                    } else {
                        debug!(%phase, elapsed_ms = elapsed.as_millis() as u64, "still waiting");
                    }
                    self.pause(self.options.poll_interval);
                }
            }
        }
    }

    /// Sleep for `interval`, waking early once cancelled.
    fn pause(&self, interval: Duration) {
        let deadline = Instant::now() + interval;
        while !self.cancel.is_cancelled() {
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::sleep((deadline - now).min(CANCEL_CHECK));
        }
    }

    fn observe(&self, log_path: &Path, phase: Phase) -> Observation {
        if phase == Phase::AwaitingLogCreation && !self.fs.exists(log_path) {
            return Observation::Missing;
        }
        match self.fs.read_to_string_lossy(log_path) {
            Ok(text) => Observation::Content(LogScan::from_text(&text)),
            Err(_) if !self.fs.exists(log_path) => Observation::Missing,
            Err(e) => {
                warn!(log = %log_path.display(), error = %format!("{e:#}"), "log unreadable; retrying");
                Observation::Unreadable
            }
        }
    }

    fn dispose(&self, run: &mut Run<'_>, verdict: Verdict) {
        let pid = run.child.id();
        let grace = self.options.reap_grace;
        let result = match verdict.disposal() {
            Disposal::Kill => {
                warn!(pid, ?verdict, "killing MATLAB process");
                run.child.kill()
            }
            Disposal::ReapThenKill => match run.child.wait_timeout(grace) {
                Ok(Some(status)) => {
                    debug!(pid, %status, "process exited after reporting failure");
                    Ok(())
                }
                Ok(None) => {
                    warn!(pid, ?grace, "process still running after reporting failure; killing");
                    run.child.kill()
                }
                Err(e) => {
                    warn!(pid, error = %format!("{e:#}"), "could not wait for process; killing");
                    run.child.kill()
                }
            },
            Disposal::Reap => match run.child.wait_timeout(grace) {
                Ok(Some(status)) => {
                    debug!(pid, %status, "process exited");
                    Ok(())
                }
                Ok(None) => {
                    info!(pid, ?grace, "process still running after finishing; leaving it be");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Disposal::Release => {
                info!(pid, "not waiting for MATLAB to finish");
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!(pid, error = %format!("{e:#}"), "failed to clean up MATLAB process");
        }
    }

    fn failure(&self, verdict: Verdict, run: &Run<'_>) -> MonitorError {
        let log = run.log_path.to_path_buf();
        match verdict {
            Verdict::LogCreationTimeout => MonitorError::LogCreationTimeout {
                log,
                timeout: self.options.start_timeout,
            },
            Verdict::StartTimeout => MonitorError::StartTimeout {
                log,
                timeout: self.options.start_timeout,
            },
            Verdict::ExecutionTimeout => MonitorError::ExecutionTimeout {
                log,
                timeout: match run.completion {
                    CompletionPolicy::Wait(budget) => budget,
                    CompletionPolicy::Detach => Duration::ZERO,
                },
            },
            Verdict::ExecutionFailed => MonitorError::ExecutionFailed { log },
            Verdict::LicenseError => MonitorError::LicenseError { log },
            Verdict::Cancelled => MonitorError::Cancelled { log },
            Verdict::Succeeded | Verdict::Detached => {
                unreachable!("successful verdicts are not failures")
            }
        }
    }
}
