#![allow(dead_code)]

pub use mlshim_test_utils::builders;
pub use mlshim_test_utils::init_tracing;

use std::path::{Path, PathBuf};

/// `sh -c <script>` as an argument vector.
pub fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

/// Shell-quote a path for embedding in an `sh -c` script.
pub fn quoted(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

/// Whether a process with `pid` still exists (and is not a zombie we own).
#[cfg(unix)]
pub fn pid_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Install a shell script standing in for MATLAB at
/// `<base>/<release>/bin/matlab` and return its path.
///
/// The script receives the same arguments MATLAB would:
/// `-nosplash -logfile <log> -r <statement>`.
#[cfg(unix)]
pub fn install_fake_matlab(base: &Path, release: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let bin = base.join(release).join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let exe = bin.join("matlab");
    std::fs::write(&exe, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
    exe
}
