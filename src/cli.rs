// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `mlshim`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mlshim",
    version,
    about = "Run MATLAB scripts unattended and report whether they finished.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). Missing file means defaults.
    #[arg(long, value_name = "PATH", default_value = "Mlshim.toml", global = true)]
    pub config: PathBuf,

    /// MATLAB release to use (e.g. R2016b). Default: newest installed.
    #[arg(long = "release", visible_alias = "ver", value_name = "RELEASE", global = true)]
    pub release: Option<String>,

    /// Directory holding the MATLAB installations.
    #[arg(long, visible_alias = "base", value_name = "DIR", global = true)]
    pub matlab_base: Option<PathBuf>,

    /// MATLAB working directory; the script and log are written here.
    #[arg(short = 'w', long, value_name = "DIR", global = true)]
    pub working_directory: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `-v` or `MLSHIM_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// More output; repeat for more (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Open an interactive MATLAB session and return once it is up.
    Launch,

    /// Run MATLAB statements and wait for them to finish.
    Run {
        /// Statements or script names to execute, in order.
        #[arg(required = true, value_name = "STATEMENT")]
        statements: Vec<String>,

        /// Data file to `load` first (repeatable).
        #[arg(long = "datafile", value_name = "FILE")]
        datafiles: Vec<PathBuf>,

        /// Folder to `addpath` first (repeatable).
        #[arg(long = "path", value_name = "DIR")]
        paths: Vec<PathBuf>,

        /// Completion timeout (e.g. "30m"), or "none" to not wait.
        #[arg(long, value_name = "DURATION")]
        timeout: Option<String>,
    },

    /// Run a named build script and wait for it to finish.
    Build {
        /// Build script file (.m).
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Completion timeout (e.g. "2h"), or "none" to not wait.
        #[arg(long, value_name = "DURATION")]
        timeout: Option<String>,
    },

    /// List installed MATLAB releases.
    Versions,

    /// Print the resolved settings without starting MATLAB.
    Debug,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
