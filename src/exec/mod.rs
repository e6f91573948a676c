// src/exec/mod.rs

//! Process execution layer.
//!
//! The monitor never touches `std::process` directly; it asks a
//! [`ProcessLauncher`] for a [`ChildHandle`]. Production code uses
//! [`RealLauncher`], tests can substitute a fake that never spawns anything.
//!
//! - [`launcher`] owns the launch description, the traits, and the real
//!   `std::process::Command` implementation.

pub mod launcher;

pub use launcher::{ChildHandle, LaunchSpec, ProcessLauncher, RealLauncher};
