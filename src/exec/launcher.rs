// src/exec/launcher.rs

//! Pluggable process launcher abstraction.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

/// Everything needed to start one external process.
///
/// `env` is applied to the child only; the parent's environment is never
/// mutated, so concurrent launches cannot observe each other's settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl LaunchSpec {
    /// Build a spec from an argument vector where element 0 is the program.
    pub fn from_command(command: &[String]) -> Result<Self> {
        let Some((program, args)) = command.split_first() else {
            bail!("command is empty");
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            env: BTreeMap::new(),
            cwd: None,
        })
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// A running child process, exclusively owned by one run.
pub trait ChildHandle: Send {
    /// OS process id, if known.
    fn id(&self) -> Option<u32>;

    /// Non-blocking exit check. `Ok(None)` means still running.
    fn try_wait(&mut self) -> Result<Option<ExitStatus>>;

    /// Force-terminate the process and reap it.
    fn kill(&mut self) -> Result<()>;

    /// Wait up to `grace` for the process to exit on its own.
    ///
    /// Returns `Ok(None)` if it is still running when the grace period ends.
    fn wait_timeout(&mut self, grace: Duration) -> Result<Option<ExitStatus>> {
        let deadline = Instant::now() + grace;
        loop {
            if let Some(status) = self.try_wait()? {
                return Ok(Some(status));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep((deadline - now).min(Duration::from_millis(50)));
        }
    }
}

/// Trait abstracting how processes are started.
pub trait ProcessLauncher: Send + Sync {
    fn spawn(&self, spec: &LaunchSpec) -> Result<Box<dyn ChildHandle>>;
}

/// Launcher backed by `std::process::Command`.
///
/// stdin is closed; stdout/stderr are inherited so MATLAB's own console
/// output stays visible to the user.
#[derive(Debug, Clone, Default)]
pub struct RealLauncher;

impl ProcessLauncher for RealLauncher {
    fn spawn(&self, spec: &LaunchSpec) -> Result<Box<dyn ChildHandle>> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(ref dir) = spec.cwd {
            cmd.current_dir(dir);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("spawning process '{}'", spec.program))?;

        info!(
            program = %spec.program,
            args = ?spec.args,
            pid = child.id(),
            "process spawned"
        );

        Ok(Box::new(RealChild { child }))
    }
}

struct RealChild {
    child: Child,
}

impl ChildHandle for RealChild {
    fn id(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        self.child
            .try_wait()
            .with_context(|| format!("polling process {}", self.child.id()))
    }

    fn kill(&mut self) -> Result<()> {
        if self.try_wait()?.is_some() {
            debug!(pid = self.child.id(), "process already exited; nothing to kill");
            return Ok(());
        }
        if let Err(e) = self.child.kill() {
            // Lost a race with a natural exit.
            if self.try_wait()?.is_none() {
                return Err(e).with_context(|| format!("killing process {}", self.child.id()));
            }
        }
        self.child
            .wait()
            .with_context(|| format!("reaping process {}", self.child.id()))?;
        info!(pid = self.child.id(), "process killed");
        Ok(())
    }
}
