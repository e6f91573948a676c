// src/install/licenses.rs

use std::path::{Path, PathBuf};

use globset::Glob;

use crate::errors::{MlshimError, Result};
use crate::fs::FileSystem;

/// Per-user license directory for a release:
/// `<appdata>/MathWorks/MATLAB/<release>_licenses`.
pub fn license_dir(appdata: &Path, release: &str) -> PathBuf {
    appdata
        .join("MathWorks")
        .join("MATLAB")
        .join(format!("{release}_licenses"))
}

/// All `*.lic` files directly inside `dir`, sorted.
///
/// A missing directory simply has no licenses.
pub fn find_licenses<F: FileSystem + ?Sized>(fs: &F, dir: &Path) -> Result<Vec<PathBuf>> {
    if !fs.is_dir(dir) {
        return Ok(Vec::new());
    }

    let matcher = Glob::new("*.lic")
        .map_err(|e| MlshimError::ConfigError(format!("invalid license pattern: {e}")))?
        .compile_matcher();

    let mut found: Vec<PathBuf> = fs
        .read_dir(dir)?
        .into_iter()
        .filter(|p| p.file_name().is_some_and(|name| matcher.is_match(name)))
        .filter(|p| fs.is_file(p))
        .collect();
    found.sort();
    Ok(found)
}
