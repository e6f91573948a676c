#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use mlshim::fs::mock::MockFileSystem;
use mlshim::install::executable_name;
use mlshim::monitor::MonitorOptions;
use mlshim::types::CompletionPolicy;

/// Builder for `MonitorOptions` with millisecond-scale defaults.
pub struct MonitorOptionsBuilder {
    options: MonitorOptions,
}

impl MonitorOptionsBuilder {
    /// 5ms polls, 300ms start budget, 600ms completion budget, 50ms grace.
    pub fn fast() -> Self {
        Self {
            options: MonitorOptions {
                poll_interval: Duration::from_millis(5),
                start_timeout: Duration::from_millis(300),
                completion: CompletionPolicy::Wait(Duration::from_millis(600)),
                reap_grace: Duration::from_millis(50),
            },
        }
    }

    pub fn poll_ms(mut self, ms: u64) -> Self {
        self.options.poll_interval = Duration::from_millis(ms);
        self
    }

    pub fn start_ms(mut self, ms: u64) -> Self {
        self.options.start_timeout = Duration::from_millis(ms);
        self
    }

    pub fn completion_ms(mut self, ms: u64) -> Self {
        self.options.completion = CompletionPolicy::Wait(Duration::from_millis(ms));
        self
    }

    pub fn detach(mut self) -> Self {
        self.options.completion = CompletionPolicy::Detach;
        self
    }

    pub fn reap_grace_ms(mut self, ms: u64) -> Self {
        self.options.reap_grace = Duration::from_millis(ms);
        self
    }

    pub fn build(self) -> MonitorOptions {
        self.options
    }
}

/// Builder for an in-memory `<base>/<release>/bin/<exe>` layout.
pub struct InstallTreeBuilder {
    fs: MockFileSystem,
    base: PathBuf,
}

impl InstallTreeBuilder {
    pub fn new(base: impl AsRef<Path>) -> Self {
        let fs = MockFileSystem::new();
        fs.add_dir(base.as_ref());
        Self {
            fs,
            base: base.as_ref().to_path_buf(),
        }
    }

    /// A release folder with a MATLAB executable in it.
    pub fn release(self, name: &str) -> Self {
        self.fs.add_file(
            self.base.join(name).join("bin").join(executable_name()),
            "",
        );
        self
    }

    /// A release folder that lacks the executable.
    pub fn broken_release(self, name: &str) -> Self {
        self.fs.add_dir(self.base.join(name).join("bin"));
        self
    }

    pub fn file(self, relative: &str, content: &str) -> Self {
        self.fs.add_file(self.base.join(relative), content);
        self
    }

    pub fn build(self) -> MockFileSystem {
        self.fs
    }
}

/// Builder for `Mlshim.toml` text.
#[derive(Default)]
pub struct ConfigTomlBuilder {
    matlab: Vec<String>,
    run: Vec<String>,
    timeouts: Vec<String>,
}

impl ConfigTomlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(mut self, dir: &Path) -> Self {
        self.matlab.push(format!("base = {:?}", dir.display().to_string()));
        self
    }

    pub fn release(mut self, release: &str) -> Self {
        self.matlab.push(format!("release = {release:?}"));
        self
    }

    pub fn working_directory(mut self, dir: &Path) -> Self {
        self.run
            .push(format!("working_directory = {:?}", dir.display().to_string()));
        self
    }

    pub fn timeout(mut self, key: &str, value: &str) -> Self {
        self.timeouts.push(format!("{key} = {value:?}"));
        self
    }

    pub fn build(self) -> String {
        let mut out = String::new();
        for (name, lines) in [
            ("matlab", &self.matlab),
            ("run", &self.run),
            ("timeouts", &self.timeouts),
        ] {
            if lines.is_empty() {
                continue;
            }
            out.push_str(&format!("[{name}]\n"));
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}
