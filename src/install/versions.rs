// src/install/versions.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{MlshimError, Result};
use crate::fs::FileSystem;

/// Narrow view of "what MATLAB releases are installed and where".
pub trait Installation {
    /// Installed release identifiers (e.g. `R2016b`), ascending.
    fn list_installed_versions(&self) -> Result<Vec<String>>;

    /// Full path of the MATLAB executable for `version`.
    fn resolve_executable_path(&self, version: &str) -> Result<PathBuf>;

    /// Newest installed release.
    fn latest_version(&self) -> Result<String>;
}

/// Executable file name inside `<release>/bin`.
pub fn executable_name() -> &'static str {
    if cfg!(windows) { "matlab.exe" } else { "matlab" }
}

/// Directory MATLAB installs its releases under by default.
pub fn default_base() -> PathBuf {
    if cfg!(windows) {
        let program_files =
            std::env::var("ProgramW6432").unwrap_or_else(|_| r"C:\Program Files".to_string());
        PathBuf::from(program_files).join("MATLAB")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Applications")
    } else {
        PathBuf::from("/usr/local/MATLAB")
    }
}

/// Installation discovery by directory layout: `<base>/<release>/bin/<exe>`.
#[derive(Debug, Clone)]
pub struct FsInstallation<F> {
    fs: F,
    base: PathBuf,
}

impl<F: FileSystem> FsInstallation<F> {
    pub fn new(fs: F, base: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            base: base.into(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn matlab_root(&self, version: &str) -> PathBuf {
        self.base.join(version)
    }

    fn executable_for(&self, version: &str) -> PathBuf {
        self.matlab_root(version).join("bin").join(executable_name())
    }
}

impl<F: FileSystem> Installation for FsInstallation<F> {
    fn list_installed_versions(&self) -> Result<Vec<String>> {
        if !self.fs.is_dir(&self.base) {
            return Err(MlshimError::NoInstalledVersions(self.base.clone()));
        }

        let mut versions: Vec<String> = self
            .fs
            .read_dir(&self.base)?
            .into_iter()
            .filter_map(|entry| {
                let name = entry.file_name()?.to_str()?.to_string();
                self.fs.is_file(&self.executable_for(&name)).then_some(name)
            })
            .collect();
        versions.sort();

        debug!(base = %self.base.display(), ?versions, "installed MATLAB releases");
        Ok(versions)
    }

    fn resolve_executable_path(&self, version: &str) -> Result<PathBuf> {
        let exe = self.executable_for(version);
        if self.fs.is_file(&exe) {
            Ok(exe)
        } else {
            Err(MlshimError::ExecutableNotFound(exe))
        }
    }

    fn latest_version(&self) -> Result<String> {
        self.list_installed_versions()?
            .pop()
            .ok_or_else(|| MlshimError::NoInstalledVersions(self.base.clone()))
    }
}
