// tests/monitor_fake.rs
//
// The monitor and session driven by a scripted fake MATLAB writing into an
// in-memory filesystem.
mod common;
use crate::common::builders::{InstallTreeBuilder, MonitorOptionsBuilder};
use crate::common::init_tracing;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use mlshim::exec::LaunchSpec;
use mlshim::fs::FileSystem;
use mlshim::fs::mock::MockFileSystem;
use mlshim::install::FsInstallation;
use mlshim::monitor::{FAILED, FINISHED, LICENSE_ERROR, Monitor, MonitorError, STARTED};
use mlshim::session::{Job, PREFDIR_ENV, Session};
use mlshim::types::Phase;
use mlshim_test_utils::fake_launcher::FakeLauncher;

type TestResult = Result<(), Box<dyn Error>>;

const LOG: &str = "/work/matlab.log";

fn work_fs() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir("/work");
    fs
}

fn matlab() -> LaunchSpec {
    LaunchSpec::from_command(&["matlab".to_string(), "-nosplash".to_string()]).unwrap()
}

#[test]
fn finished_and_failed_together_count_as_success() -> TestResult {
    init_tracing();
    let fs = work_fs();
    let launcher = FakeLauncher::new(fs.clone(), LOG)
        .line_at(10, STARTED)
        .line_at(20, &format!("{FAILED}\n{FINISHED}"))
        .exit_at(40);
    let monitor = Monitor::new(
        launcher.clone(),
        fs,
        MonitorOptionsBuilder::fast().poll_ms(50).build(),
    );

    let report = monitor.run(&matlab(), Path::new(LOG))?;

    assert_eq!(report.phase, Phase::Succeeded);
    assert!(!launcher.was_killed());
    assert_eq!(launcher.launched(), vec![matlab()]);
    Ok(())
}

#[test]
fn completion_budget_counts_from_started() -> TestResult {
    init_tracing();
    let fs = work_fs();
    // Finished lands 350ms after launch but only 200ms after Started.
    let launcher = FakeLauncher::new(fs.clone(), LOG)
        .line_at(0, "MATLAB is initialising")
        .line_at(150, STARTED)
        .line_at(350, FINISHED)
        .exit_at(360);
    let options = MonitorOptionsBuilder::fast()
        .start_ms(1_000)
        .completion_ms(300)
        .build();
    let monitor = Monitor::new(launcher.clone(), fs, options);

    let report = monitor.run(&matlab(), Path::new(LOG))?;

    assert_eq!(report.phase, Phase::Succeeded);
    assert!(!launcher.was_killed());
    Ok(())
}

#[test]
fn license_error_before_start_is_reported_and_process_reaped() -> TestResult {
    init_tracing();
    let fs = work_fs();
    let launcher = FakeLauncher::new(fs.clone(), LOG)
        .line_at(10, "License checkout failed.")
        .line_at(10, &format!("{LICENSE_ERROR}: -8,523"));
    let monitor = Monitor::new(launcher.clone(), fs, MonitorOptionsBuilder::fast().build());

    let err = monitor.run(&matlab(), Path::new(LOG)).unwrap_err();

    assert!(matches!(err, MonitorError::LicenseError { .. }), "{err:?}");
    assert_eq!(err.exit_code(), 6);
    // Never exits on its own, so the grace period ends in a kill.
    assert!(launcher.was_killed());
    Ok(())
}

#[test]
fn failed_process_that_exits_is_not_killed() -> TestResult {
    init_tracing();
    let fs = work_fs();
    let launcher = FakeLauncher::new(fs.clone(), LOG)
        .line_at(5, STARTED)
        .line_at(15, FAILED)
        .exit_at(20);
    let monitor = Monitor::new(
        launcher.clone(),
        fs,
        MonitorOptionsBuilder::fast().reap_grace_ms(500).build(),
    );

    let err = monitor.run(&matlab(), Path::new(LOG)).unwrap_err();

    assert!(matches!(err, MonitorError::ExecutionFailed { .. }), "{err:?}");
    assert!(!launcher.was_killed());
    Ok(())
}

#[test]
fn log_without_started_is_a_start_timeout() -> TestResult {
    init_tracing();
    let fs = work_fs();
    let launcher = FakeLauncher::new(fs.clone(), LOG).line_at(5, "splash");
    let monitor = Monitor::new(
        launcher.clone(),
        fs,
        MonitorOptionsBuilder::fast().start_ms(100).build(),
    );

    let err = monitor.run(&matlab(), Path::new(LOG)).unwrap_err();

    assert!(matches!(err, MonitorError::StartTimeout { .. }), "{err:?}");
    assert_eq!(err.exit_code(), 3);
    assert!(launcher.was_killed());
    Ok(())
}

fn session_fixture() -> (MockFileSystem, Session) {
    let fs = InstallTreeBuilder::new("/ml")
        .release("R2015a")
        .release("R2016b")
        .build();
    let installation = FsInstallation::new(fs.clone(), "/ml");
    let session = Session::new(&installation, None, Path::new("/work"), None).unwrap();
    (fs, session)
}

#[test]
fn session_writes_script_and_launches_matlab() -> TestResult {
    init_tracing();
    let (fs, session) = session_fixture();
    let launcher = FakeLauncher::new(fs.clone(), session.log_file())
        .line_at(10, STARTED)
        .line_at(20, FINISHED)
        .exit_at(25);
    let monitor = Monitor::new(launcher.clone(), fs.clone(), MonitorOptionsBuilder::fast().build());
    let job = Job::Run {
        statements: vec!["results = bench();".to_string()],
        datafiles: vec![PathBuf::from("/data/in.mat")],
        paths: vec![PathBuf::from("/tools")],
    };

    let report = session.run(&job, &monitor)?;
    assert_eq!(report.phase, Phase::Succeeded);
    assert_eq!(report.log_path, session.log_file());

    let script = fs.read_to_string_lossy(&session.run_script())?;
    assert!(script.contains("results = bench();"));
    assert!(script.contains("addpath('/tools');"));
    assert!(script.contains("load('/data/in.mat');"));
    assert!(fs.is_dir(session.pref_dir()));

    let launched = launcher.launched();
    assert_eq!(launched.len(), 1);
    let spec = &launched[0];
    assert_eq!(Path::new(&spec.program), session.executable());
    assert!(spec.program.contains("R2016b"));
    assert_eq!(
        spec.env.get(PREFDIR_ENV).map(PathBuf::from).as_deref(),
        Some(session.pref_dir())
    );
    assert_eq!(spec.cwd.as_deref(), Some(Path::new("/work")));
    Ok(())
}

#[test]
fn launch_job_detaches_once_started() -> TestResult {
    init_tracing();
    let (fs, session) = session_fixture();
    let launcher = FakeLauncher::new(fs.clone(), session.log_file()).line_at(10, STARTED);
    let monitor = Monitor::new(launcher.clone(), fs.clone(), MonitorOptionsBuilder::fast().build());

    let report = session.run(&Job::Launch, &monitor)?;

    assert_eq!(report.phase, Phase::Detached);
    assert!(!launcher.was_killed());
    let script = fs.read_to_string_lossy(&session.run_script())?;
    assert!(!script.contains("quit"));
    Ok(())
}

#[test]
fn harness_finishing_at_two_ticks_succeeds_promptly() -> TestResult {
    init_tracing();
    let fs = work_fs();
    let launcher = FakeLauncher::new(fs.clone(), LOG)
        .line_at(100, STARTED)
        .line_at(200, FINISHED)
        .exit_at(210);
    let options = MonitorOptionsBuilder::fast()
        .poll_ms(20)
        .start_ms(500)
        .completion_ms(1_000)
        .build();
    let monitor = Monitor::new(launcher, fs, options);

    let report = monitor.run(&matlab(), Path::new(LOG))?;

    assert_eq!(report.phase, Phase::Succeeded);
    assert!(report.elapsed >= Duration::from_millis(190));
    assert!(report.elapsed < Duration::from_millis(200 + 20 + 150));
    Ok(())
}

#[test]
fn silent_harness_times_out_one_start_plus_budget_after_launch() -> TestResult {
    init_tracing();
    let fs = work_fs();
    let launcher = FakeLauncher::new(fs.clone(), LOG).line_at(100, STARTED);
    let options = MonitorOptionsBuilder::fast()
        .poll_ms(10)
        .start_ms(500)
        .completion_ms(300)
        .build();
    let monitor = Monitor::new(launcher.clone(), fs, options);

    let began = Instant::now();
    let err = monitor.run(&matlab(), Path::new(LOG)).unwrap_err();
    let took = began.elapsed();

    match err {
        MonitorError::ExecutionTimeout { timeout, .. } => {
            assert_eq!(timeout, Duration::from_millis(300))
        }
        other => panic!("expected ExecutionTimeout, got {other:?}"),
    }
    assert!(took >= Duration::from_millis(400), "{took:?}");
    assert!(took < Duration::from_millis(400 + 250), "{took:?}");
    assert!(launcher.was_killed());
    Ok(())
}
