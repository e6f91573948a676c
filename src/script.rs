// src/script.rs

//! Startup script generation.
//!
//! MATLAB is started with `-r "run('<script>');"`. The generated script is
//! what prints the sentinel lines the monitor waits for, so its shape is fixed:
//! `Started` first, then the user's work inside `try`, then `Finished`, with
//! `Failed` printed from the `catch` block.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat};
use uuid::Uuid;

use crate::monitor::{FAILED, FINISHED, STARTED};

/// Everything that goes into one generated `.m` file.
#[derive(Debug, Clone)]
pub struct ScriptSpec {
    pub created: DateTime<Local>,
    pub session_id: Uuid,
    pub script_id: Uuid,
    pub working_directory: PathBuf,
    /// Folders passed to `addpath`.
    pub paths: Vec<PathBuf>,
    /// Files passed to `load`.
    pub datafiles: Vec<PathBuf>,
    /// MATLAB statements, one per line.
    pub statements: Vec<String>,
    /// End with `quit('force')` so the process exits once done.
    pub quit: bool,
}

impl ScriptSpec {
    pub fn new(session_id: Uuid, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            created: Local::now(),
            session_id,
            script_id: Uuid::new_v4(),
            working_directory: working_directory.into(),
            paths: Vec::new(),
            datafiles: Vec::new(),
            statements: Vec::new(),
            quit: true,
        }
    }

    pub fn path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.push(dir.into());
        self
    }

    pub fn datafile(mut self, file: impl Into<PathBuf>) -> Self {
        self.datafiles.push(file.into());
        self
    }

    pub fn statement(mut self, stmt: impl Into<String>) -> Self {
        self.statements.push(stmt.into());
        self
    }

    pub fn quit(mut self, quit: bool) -> Self {
        self.quit = quit;
        self
    }

    /// Render the MATLAB source.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "% Generated by mlshim. Do not edit.")?;
        writeln!(
            out,
            "% Script Creation: {}",
            self.created.to_rfc3339_opts(SecondsFormat::Secs, false)
        )?;
        writeln!(out, "% mlshim uuid: {}", self.session_id)?;
        writeln!(out, "% script uuid: {}", self.script_id)?;
        writeln!(out, "disp({});", quote(STARTED))?;
        writeln!(out, "try")?;
        writeln!(out, "    cd({});", quote_path(&self.working_directory))?;
        for dir in &self.paths {
            writeln!(out, "    addpath({});", quote_path(dir))?;
        }
        for file in &self.datafiles {
            writeln!(out, "    load({});", quote_path(file))?;
        }
        for stmt in &self.statements {
            for line in stmt.lines() {
                writeln!(out, "    {line}")?;
            }
        }
        writeln!(out, "    disp({});", quote(FINISHED))?;
        writeln!(out, "catch mlshim_err")?;
        writeln!(out, "    disp(getReport(mlshim_err, 'extended'));")?;
        writeln!(out, "    disp({});", quote(FAILED))?;
        writeln!(out, "end")?;
        if self.quit {
            writeln!(out, "quit('force');")?;
        }
        Ok(())
    }
}

/// MATLAB char-vector literal: single-quoted, embedded quotes doubled.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

pub fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

/// The `-r` argument that runs a script file.
pub fn run_statement(script: &Path) -> String {
    format!("run({});", quote_path(script))
}
