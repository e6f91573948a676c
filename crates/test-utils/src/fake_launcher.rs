use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use mlshim::exec::{ChildHandle, LaunchSpec, ProcessLauncher};
use mlshim::fs::mock::MockFileSystem;

/// A fake MATLAB that:
/// - records every `LaunchSpec` it was asked to start
/// - writes scripted lines into a `MockFileSystem` log at fixed offsets
///   after spawn (stopping once killed)
/// - optionally exits on its own after a delay, otherwise runs until killed.
#[derive(Clone)]
pub struct FakeLauncher {
    fs: MockFileSystem,
    log_path: PathBuf,
    lines: Vec<(Duration, String)>,
    exit_after: Option<Duration>,
    state: Arc<Mutex<FakeState>>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub launched: Vec<LaunchSpec>,
    pub killed: bool,
}

impl FakeLauncher {
    pub fn new(fs: MockFileSystem, log_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            log_path: log_path.into(),
            lines: Vec::new(),
            exit_after: None,
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    /// Append `line` (plus newline) to the log `ms` milliseconds after spawn.
    pub fn line_at(mut self, ms: u64, line: &str) -> Self {
        self.lines
            .push((Duration::from_millis(ms), format!("{line}\n")));
        self
    }

    /// Exit on its own `ms` milliseconds after spawn.
    pub fn exit_at(mut self, ms: u64) -> Self {
        self.exit_after = Some(Duration::from_millis(ms));
        self
    }

    pub fn was_killed(&self) -> bool {
        self.state.lock().unwrap().killed
    }

    pub fn launched(&self) -> Vec<LaunchSpec> {
        self.state.lock().unwrap().launched.clone()
    }
}

impl ProcessLauncher for FakeLauncher {
    fn spawn(&self, spec: &LaunchSpec) -> anyhow::Result<Box<dyn ChildHandle>> {
        self.state.lock().unwrap().launched.push(spec.clone());
        let spawned = Instant::now();

        let fs = self.fs.clone();
        let log = self.log_path.clone();
        let mut lines = self.lines.clone();
        lines.sort_by_key(|(at, _)| *at);
        let state = Arc::clone(&self.state);
        thread::spawn(move || {
            for (at, line) in lines {
                if let Some(wait) = at.checked_sub(spawned.elapsed()) {
                    thread::sleep(wait);
                }
                if state.lock().unwrap().killed {
                    return;
                }
                fs.append(&log, line);
            }
        });

        Ok(Box::new(FakeChild {
            spawned,
            exit_after: self.exit_after,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeChild {
    spawned: Instant,
    exit_after: Option<Duration>,
    state: Arc<Mutex<FakeState>>,
}

impl ChildHandle for FakeChild {
    fn id(&self) -> Option<u32> {
        Some(4242)
    }

    fn try_wait(&mut self) -> anyhow::Result<Option<ExitStatus>> {
        if self.state.lock().unwrap().killed {
            return Ok(Some(exit_status(1)));
        }
        match self.exit_after {
            Some(after) if self.spawned.elapsed() >= after => Ok(Some(exit_status(0))),
            _ => Ok(None),
        }
    }

    fn kill(&mut self) -> anyhow::Result<()> {
        let exited = self
            .exit_after
            .is_some_and(|after| self.spawned.elapsed() >= after);
        if !exited {
            self.state.lock().unwrap().killed = true;
        }
        Ok(())
    }
}

fn exit_status(code: i32) -> ExitStatus {
    #[cfg(unix)]
    {
        <ExitStatus as std::os::unix::process::ExitStatusExt>::from_raw(code << 8)
    }
    #[cfg(windows)]
    {
        <ExitStatus as std::os::windows::process::ExitStatusExt>::from_raw(code as u32)
    }
}
