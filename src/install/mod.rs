// src/install/mod.rs

//! Locating MATLAB installations and their license files.
//!
//! Everything here goes through [`crate::fs::FileSystem`], so discovery can be
//! exercised against an in-memory tree instead of a real installation.

pub mod licenses;
pub mod versions;

pub use licenses::{find_licenses, license_dir};
pub use versions::{FsInstallation, Installation, default_base, executable_name};
