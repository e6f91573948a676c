// src/monitor/core.rs

//! Pure lifecycle state machine.
//!
//! [`MonitorCore`] consumes one [`Observation`] of the log per poll together
//! with the time elapsed since launch, and answers whether to keep polling or
//! which [`Verdict`] was reached. It owns no process, no file and no clock,
//! so every transition can be unit tested deterministically.
//!
//! The IO shell in [`super::runner`] does the spawning, reading and sleeping.

use std::time::Duration;

use crate::monitor::log::LogScan;
use crate::types::{CompletionPolicy, Phase};

/// Result of looking at the log path once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Nothing exists at the log path.
    Missing,
    /// The file exists but could not be read this time.
    Unreadable,
    /// The file was read in full.
    Content(LogScan),
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Succeeded,
    Detached,
    ExecutionFailed,
    LicenseError,
    LogCreationTimeout,
    StartTimeout,
    ExecutionTimeout,
    /// Stopped from outside before any other verdict.
    Cancelled,
}

/// What the shell must do with the child once a verdict is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposal {
    /// Kill immediately.
    Kill,
    /// Give the process a bounded grace period to exit, then kill it.
    ReapThenKill,
    /// Give the process a bounded grace period to exit; never kill.
    Reap,
    /// Hand the process over to the user and stop tracking it.
    Release,
}

impl Verdict {
    pub fn phase(self) -> Phase {
        match self {
            Verdict::Succeeded => Phase::Succeeded,
            Verdict::Detached => Phase::Detached,
            Verdict::ExecutionFailed | Verdict::LicenseError => Phase::Failed,
            Verdict::LogCreationTimeout | Verdict::StartTimeout | Verdict::ExecutionTimeout => {
                Phase::TimedOut
            }
            Verdict::Cancelled => Phase::Cancelled,
        }
    }

    pub fn disposal(self) -> Disposal {
        match self {
            Verdict::Succeeded => Disposal::Reap,
            Verdict::Detached => Disposal::Release,
            Verdict::ExecutionFailed | Verdict::LicenseError => Disposal::ReapThenKill,
            Verdict::LogCreationTimeout
            | Verdict::StartTimeout
            | Verdict::ExecutionTimeout
            | Verdict::Cancelled => Disposal::Kill,
        }
    }
}

/// Answer to one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Sleep one poll interval and observe again.
    Poll,
    /// Stop polling.
    Finish(Verdict),
}

#[derive(Debug, Clone)]
pub struct MonitorCore {
    start_timeout: Duration,
    completion: CompletionPolicy,
    phase: Phase,
    /// Elapsed-since-launch at which `Started` was first seen.
    started_at: Option<Duration>,
    verdict: Option<Verdict>,
    history: Vec<Phase>,
}

impl MonitorCore {
    pub fn new(start_timeout: Duration, completion: CompletionPolicy) -> Self {
        Self {
            start_timeout,
            completion,
            phase: Phase::AwaitingLogCreation,
            started_at: None,
            verdict: None,
            history: vec![Phase::AwaitingLogCreation],
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    /// Every phase entered so far, in order.
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    /// Elapsed-since-launch at which the `Started` sentinel was observed.
    pub fn started_at(&self) -> Option<Duration> {
        self.started_at
    }

    /// Feed one observation taken `elapsed` after launch.
    ///
    /// A single observation can advance several phases at once: a log that
    /// already holds `Started` and `Finished` when it is first seen goes
    /// straight to `Succeeded`. Once a verdict exists it is returned again
    /// without looking at the observation.
    pub fn observe(&mut self, observation: Observation, elapsed: Duration) -> Step {
        if let Some(verdict) = self.verdict {
            return Step::Finish(verdict);
        }

        loop {
            let step = match self.phase {
                Phase::AwaitingLogCreation => self.await_log_creation(observation, elapsed),
                Phase::AwaitingStart => self.await_start(observation, elapsed),
                Phase::AwaitingCompletion => self.await_completion(observation, elapsed),
                _ => unreachable!("terminal phase without a verdict"),
            };
            match step {
                Some(step) => return step,
                // Phase advanced; judge the same observation in the new phase.
                None => continue,
            }
        }
    }

    /// Stop the run regardless of what the log says.
    ///
    /// An existing verdict is kept.
    pub fn cancel(&mut self) -> Step {
        match self.verdict {
            Some(verdict) => Step::Finish(verdict),
            None => self.finish(Verdict::Cancelled),
        }
    }

    fn await_log_creation(&mut self, observation: Observation, elapsed: Duration) -> Option<Step> {
        match observation {
            Observation::Missing => {
                if elapsed > self.start_timeout {
                    Some(self.finish(Verdict::LogCreationTimeout))
                } else {
                    Some(Step::Poll)
                }
            }
            Observation::Unreadable | Observation::Content(_) => {
                self.enter(Phase::AwaitingStart);
                None
            }
        }
    }

    fn await_start(&mut self, observation: Observation, elapsed: Duration) -> Option<Step> {
        if let Observation::Content(scan) = observation {
            if scan.license_error {
                return Some(self.finish(Verdict::LicenseError));
            }
            if scan.started {
                self.started_at = Some(elapsed);
                self.enter(Phase::AwaitingCompletion);
                if self.completion == CompletionPolicy::Detach {
                    return Some(self.finish(Verdict::Detached));
                }
                return None;
            }
        }
        if elapsed > self.start_timeout {
            Some(self.finish(Verdict::StartTimeout))
        } else {
            Some(Step::Poll)
        }
    }

    fn await_completion(&mut self, observation: Observation, elapsed: Duration) -> Option<Step> {
        if let Observation::Content(scan) = observation {
            if scan.license_error {
                return Some(self.finish(Verdict::LicenseError));
            }
            if scan.finished {
                return Some(self.finish(Verdict::Succeeded));
            }
            if scan.failed {
                return Some(self.finish(Verdict::ExecutionFailed));
            }
        }

        let budget = match self.completion {
            CompletionPolicy::Wait(budget) => budget,
            CompletionPolicy::Detach => return Some(self.finish(Verdict::Detached)),
        };
        let started_at = self.started_at.unwrap_or_default();
        if elapsed.saturating_sub(started_at) > budget {
            Some(self.finish(Verdict::ExecutionTimeout))
        } else {
            Some(Step::Poll)
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug_assert!(phase > self.phase, "phases only move forward");
        self.phase = phase;
        self.history.push(phase);
    }

    fn finish(&mut self, verdict: Verdict) -> Step {
        self.enter(verdict.phase());
        self.verdict = Some(verdict);
        Step::Finish(verdict)
    }
}
