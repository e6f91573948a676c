// src/monitor/log.rs

//! Sentinel scanning of the MATLAB log file.
//!
//! The log is always scanned as a whole: every poll re-reads the full file
//! and rebuilds a [`LogScan`]. There is no read cursor, since MATLAB has been
//! seen rewriting the log rather than appending to it.

/// Printed by the startup script before the user's work begins.
pub const STARTED: &str = "########## Started ##########";
/// Printed by the startup script after the user's work returned normally.
pub const FINISHED: &str = "########## Finished ##########";
/// Printed by the startup script's `catch` block.
pub const FAILED: &str = "########## Failed ##########";
/// Substring MATLAB writes when no license could be checked out.
pub const LICENSE_ERROR: &str = "Error checking out license";

/// What one full read of the log revealed.
///
/// Sentinels are matched as whole lines (after trimming whitespace) anywhere
/// in the file; order does not matter. The license error is matched as a
/// substring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogScan {
    pub started: bool,
    pub finished: bool,
    pub failed: bool,
    pub license_error: bool,
}

impl LogScan {
    pub fn from_text(text: &str) -> Self {
        let mut scan = LogScan {
            license_error: text.contains(LICENSE_ERROR),
            ..LogScan::default()
        };
        for line in text.lines() {
            match line.trim() {
                STARTED => scan.started = true,
                FINISHED => scan.finished = true,
                FAILED => scan.failed = true,
                _ => {}
            }
        }
        scan
    }
}
