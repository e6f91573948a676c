// src/session.rs

//! One MATLAB invocation: pick the executable, write the startup script,
//! and hand the command line to the monitor.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::Result;
use crate::exec::{LaunchSpec, ProcessLauncher};
use crate::fs::FileSystem;
use crate::install::Installation;
use crate::monitor::{Monitor, RunReport};
use crate::script::{ScriptSpec, run_statement};
use crate::types::CompletionPolicy;

/// Environment variable MATLAB reads to locate its preferences directory.
pub const PREFDIR_ENV: &str = "MATLAB_PREFDIR";

/// What MATLAB should do once started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Open an interactive session and return as soon as it is up.
    Launch,
    /// Execute statements, after adding `paths` and loading `datafiles`.
    Run {
        statements: Vec<String>,
        datafiles: Vec<PathBuf>,
        paths: Vec<PathBuf>,
    },
    /// Execute a named build script file.
    Build { script: PathBuf },
}

impl Job {
    /// Interactive sessions never wait for completion.
    pub fn completion_policy(&self, configured: CompletionPolicy) -> CompletionPolicy {
        match self {
            Job::Launch => CompletionPolicy::Detach,
            Job::Run { .. } | Job::Build { .. } => configured,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    release: String,
    executable: PathBuf,
    working_directory: PathBuf,
    pref_dir: PathBuf,
}

impl Session {
    /// Resolve the release (newest installed if `release` is `None`) and
    /// check that its executable exists.
    pub fn new<I: Installation + ?Sized>(
        installation: &I,
        release: Option<&str>,
        working_directory: &Path,
        pref_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let release = match release {
            Some(r) => r.to_string(),
            None => installation.latest_version()?,
        };
        let executable = installation.resolve_executable_path(&release)?;
        let working_directory = std::path::absolute(working_directory)?;

        let id = Uuid::new_v4();
        let pref_dir =
            pref_dir.unwrap_or_else(|| working_directory.join(format!("prefs_{}", id.simple())));

        Ok(Self {
            id,
            release,
            executable,
            working_directory,
            pref_dir,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn pref_dir(&self) -> &Path {
        &self.pref_dir
    }

    pub fn log_file(&self) -> PathBuf {
        self.working_directory
            .join(format!("mlshim_{}.log", self.id.simple()))
    }

    pub fn run_script(&self) -> PathBuf {
        self.working_directory
            .join(format!("mlshim_{}.m", self.id.simple()))
    }

    /// MATLAB command line; element 0 is the executable.
    pub fn command(&self) -> Vec<String> {
        vec![
            self.executable.to_string_lossy().into_owned(),
            "-nosplash".to_string(),
            "-logfile".to_string(),
            self.log_file().to_string_lossy().into_owned(),
            "-r".to_string(),
            run_statement(&self.run_script()),
        ]
    }

    pub fn launch_spec(&self) -> Result<LaunchSpec> {
        Ok(LaunchSpec::from_command(&self.command())?
            .env(PREFDIR_ENV, self.pref_dir.to_string_lossy())
            .cwd(&self.working_directory))
    }

    pub fn script_for(&self, job: &Job) -> ScriptSpec {
        let base = ScriptSpec::new(self.id, &self.working_directory);
        match job {
            Job::Launch => base.quit(false),
            Job::Run {
                statements,
                datafiles,
                paths,
            } => {
                let with_paths = paths.iter().fold(base, |s, p| s.path(p));
                let with_data = datafiles.iter().fold(with_paths, |s, d| s.datafile(d));
                statements.iter().fold(with_data, |s, st| s.statement(st))
            }
            Job::Build { script } => base.statement(run_statement(script)),
        }
    }

    /// Write the startup script and run MATLAB under `monitor`.
    pub fn run<L, F>(&self, job: &Job, monitor: &Monitor<L, F>) -> Result<RunReport>
    where
        L: ProcessLauncher,
        F: FileSystem,
    {
        let fs = monitor.fs();
        fs.create_dir_all(&self.working_directory)?;
        fs.create_dir_all(&self.pref_dir)?;

        let script = self.script_for(job).render();
        fs.write(&self.run_script(), script.as_bytes())?;
        debug!(script = %self.run_script().display(), "startup script written");

        let policy = job.completion_policy(monitor.options().completion);
        info!(
            session = %self.id,
            release = %self.release,
            log = %self.log_file().display(),
            ?policy,
            "starting MATLAB"
        );
        let report = monitor.run_with(&self.launch_spec()?, &self.log_file(), policy)?;
        Ok(report)
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Matlab<{}, '{}', {}>",
            self.release,
            self.working_directory.display(),
            self.id
        )
    }
}
