// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod install;
pub mod logging;
pub mod monitor;
pub mod script;
pub mod session;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_or_default;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{MlshimError, Result};
use crate::exec::RealLauncher;
use crate::fs::RealFileSystem;
use crate::install::{FsInstallation, Installation, default_base, find_licenses, license_dir};
use crate::monitor::{Monitor, RunReport};
use crate::session::{Job, Session};
use crate::types::Phase;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - installation discovery
/// - the session (script + command line) and the blocking monitor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;
    let base = cfg.matlab.base.clone().unwrap_or_else(default_base);
    let installation = FsInstallation::new(RealFileSystem, base);

    let job = match args.command {
        Command::Versions => return print_versions(&installation),
        Command::Debug => {
            print_debug(&cfg, &installation);
            return Ok(());
        }
        Command::Launch => Job::Launch,
        Command::Run {
            statements,
            datafiles,
            paths,
            ..
        } => Job::Run {
            statements,
            datafiles,
            paths,
        },
        Command::Build { script, .. } => Job::Build { script },
    };

    let working_directory = match cfg.run.working_directory {
        Some(ref dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let session = Session::new(
        &installation,
        cfg.matlab.release.as_deref(),
        &working_directory,
        cfg.run.pref_dir.clone(),
    )?;
    info!(%session, "session ready");

    let monitor = Monitor::new(RealLauncher, RealFileSystem, cfg.monitor);
    let cancel = monitor.cancel_token();
    let mut task = tokio::task::spawn_blocking(move || session.run(&job, &monitor));

    tokio::select! {
        joined = &mut task => {
            let report = joined.map_err(|e| anyhow!("monitor task failed: {e}"))??;
            report_outcome(&report);
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; stopping MATLAB");
            cancel.cancel();
            match task.await {
                Ok(outcome) => debug!(?outcome, "monitor stopped"),
                Err(e) => warn!(error = %e, "monitor task failed while stopping"),
            }
            Err(MlshimError::Interrupted)
        }
    }
}

/// Config file (or defaults) with the global CLI flags layered on top,
/// validated once.
pub fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = load_or_default(&args.config)?;
    apply_overrides(&mut raw, args);
    ConfigFile::try_from(raw)
}

fn apply_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some(ref release) = args.release {
        raw.matlab.release = Some(release.clone());
    }
    if let Some(ref base) = args.matlab_base {
        raw.matlab.base = Some(base.clone());
    }
    if let Some(ref dir) = args.working_directory {
        raw.run.working_directory = Some(dir.clone());
    }
    match args.command {
        Command::Run {
            timeout: Some(ref t),
            ..
        }
        | Command::Build {
            timeout: Some(ref t),
            ..
        } => raw.timeouts.completion = t.clone(),
        _ => {}
    }
}

fn report_outcome(report: &RunReport) {
    match report.phase {
        Phase::Detached => info!(
            pid = ?report.pid,
            log = %report.log_path.display(),
            "MATLAB started; not waiting for it to finish"
        ),
        _ => info!(
            elapsed = ?report.elapsed,
            log = %report.log_path.display(),
            "MATLAB finished"
        ),
    }
}

fn print_versions<I: Installation>(installation: &I) -> Result<()> {
    for version in installation.list_installed_versions()? {
        println!("{version}");
    }
    Ok(())
}

/// Print resolved settings without starting anything.
fn print_debug(cfg: &ConfigFile, installation: &FsInstallation<RealFileSystem>) {
    println!("mlshim debug");
    println!("  matlab.base = {}", installation.base().display());

    let release = match cfg.matlab.release.clone() {
        Some(r) => Some(r),
        None => installation.latest_version().ok(),
    };
    match release {
        Some(ref r) => {
            println!("  matlab.release = {r}");
            match installation.resolve_executable_path(r) {
                Ok(exe) => println!("  matlab.executable = {}", exe.display()),
                Err(e) => println!("  matlab.executable = <{e}>"),
            }
        }
        None => println!("  matlab.release = <none installed>"),
    }

    let wd = cfg
        .run
        .working_directory
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    println!("  run.working_directory = {}", wd.display());
    match cfg.run.pref_dir {
        Some(ref p) => println!("  run.pref_dir = {}", p.display()),
        None => println!("  run.pref_dir = <fresh per session>"),
    }

    let m = &cfg.monitor;
    println!("  timeouts.poll_interval = {:?}", m.poll_interval);
    println!("  timeouts.start = {:?}", m.start_timeout);
    println!("  timeouts.completion = {:?}", m.completion);
    println!("  timeouts.reap_grace = {:?}", m.reap_grace);

    if let (Some(release), Ok(appdata)) = (release, std::env::var("APPDATA")) {
        let dir = license_dir(Path::new(&appdata), &release);
        match find_licenses(&RealFileSystem, &dir) {
            Ok(files) if files.is_empty() => println!("  licenses = <none in {}>", dir.display()),
            Ok(files) => {
                println!("  licenses:");
                for f in files {
                    println!("    - {}", f.display());
                }
            }
            Err(e) => println!("  licenses = <{e}>"),
        }
    }

    debug!("debug output complete (nothing started)");
}
