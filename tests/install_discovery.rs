// tests/install_discovery.rs
mod common;
use crate::common::builders::InstallTreeBuilder;
use crate::common::init_tracing;

use std::path::{Path, PathBuf};

use mlshim::errors::MlshimError;
use mlshim::fs::RealFileSystem;
use mlshim::install::{FsInstallation, Installation, find_licenses, license_dir};

#[test]
fn newest_release_with_an_executable_wins() {
    init_tracing();
    let fs = InstallTreeBuilder::new("/apps/MATLAB")
        .release("R2014b")
        .release("R2016a")
        .broken_release("R2017a")
        .file("license_agreement.txt", "")
        .build();
    let inst = FsInstallation::new(fs, "/apps/MATLAB");

    assert_eq!(
        inst.list_installed_versions().unwrap(),
        vec!["R2014b".to_string(), "R2016a".to_string()]
    );
    assert_eq!(inst.latest_version().unwrap(), "R2016a");
    assert!(matches!(
        inst.resolve_executable_path("R2017a"),
        Err(MlshimError::ExecutableNotFound(_))
    ));
}

#[test]
fn empty_or_missing_base_has_no_versions() {
    init_tracing();
    let empty = FsInstallation::new(InstallTreeBuilder::new("/apps/MATLAB").build(), "/apps/MATLAB");
    assert!(empty.list_installed_versions().unwrap().is_empty());
    assert!(matches!(
        empty.latest_version(),
        Err(MlshimError::NoInstalledVersions(_))
    ));

    let missing = FsInstallation::new(InstallTreeBuilder::new("/apps/MATLAB").build(), "/nope");
    assert!(matches!(
        missing.list_installed_versions(),
        Err(MlshimError::NoInstalledVersions(p)) if p == Path::new("/nope")
    ));
}

#[test]
fn license_files_are_found_on_disk() {
    init_tracing();
    let appdata = tempfile::tempdir().unwrap();
    let dir = license_dir(appdata.path(), "R2016b");
    std::fs::create_dir_all(dir.join("nested.lic")).unwrap();
    std::fs::write(dir.join("network.lic"), "SERVER x").unwrap();
    std::fs::write(dir.join("trial_R2016b.lic"), "").unwrap();
    std::fs::write(dir.join("readme.txt"), "").unwrap();

    let found = find_licenses(&RealFileSystem, &dir).unwrap();
    assert_eq!(
        found,
        vec![dir.join("network.lic"), dir.join("trial_R2016b.lic")]
    );

    let other = find_licenses(&RealFileSystem, &license_dir(appdata.path(), "R2009a")).unwrap();
    assert_eq!(other, Vec::<PathBuf>::new());
}
