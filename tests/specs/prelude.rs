//! Shared helpers for the CLI specs.
//!
//! Every `Project` is a temp dir; its `sisyphus()` command writes logs
//! and the lock file inside it, so specs never touch `~/Logs`.

#![allow(dead_code)]

use assert_cmd::assert::Assert;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

/// Upper bound for polling loops
pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

/// Job name used unless a spec overrides `-j`
pub const JOB: &str = "spec";

pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Default lock file of `job` inside this project
    pub fn lock_path(&self, job: &str) -> PathBuf {
        self.path().join("locks").join(format!("{job}.lock"))
    }

    /// Directory holding the log files of `job`
    pub fn log_dir(&self, job: &str) -> PathBuf {
        self.path().join("logs").join(job)
    }

    pub fn current_link(&self, job: &str) -> PathBuf {
        self.log_dir(job).join("current.log")
    }

    /// Contents of the current log of `job`
    pub fn current_log(&self, job: &str) -> String {
        std::fs::read_to_string(self.current_link(job)).unwrap()
    }

    /// Regular log files of `job`, sorted by name
    pub fn log_files(&self, job: &str) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.log_dir(job)) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| !p.is_symlink() && p.is_file())
            .collect();
        files.sort();
        files
    }

    /// Create a log file of `job` last modified `days` ago
    pub fn aged_log(&self, job: &str, name: &str, days: u64) -> PathBuf {
        let path = self.log_dir(job).join(name);
        std::fs::create_dir_all(self.log_dir(job)).unwrap();
        std::fs::write(&path, "old run\n").unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(days * 86_400))
            .unwrap();
        path
    }

    /// `sisyphus` with logs and locks redirected into this project
    pub fn sisyphus(&self) -> CliBuilder {
        let logs = self.path().join("logs");
        let locks = self.path().join("locks");
        CliBuilder {
            options: vec![
                "-p".into(),
                "SPEC".into(),
                "--log-file-name".into(),
                format!(
                    "{}/{{{{ job }}}}/{{{{ start_time|strftime('%H-%M-%S-%6f') }}}}.log",
                    logs.display()
                ),
                "--log-link-name".into(),
                format!("{}/{{{{ job }}}}/current.log", logs.display()),
                "--lock-file-name".into(),
                format!("{}/{{{{ job }}}}.lock", locks.display()),
            ],
            job: JOB.to_string(),
            lock_file: None,
            command: Vec::new(),
        }
    }
}

pub struct CliBuilder {
    options: Vec<String>,
    job: String,
    lock_file: Option<PathBuf>,
    command: Vec<String>,
}

impl CliBuilder {
    /// Job name passed with `-j`
    pub fn job(mut self, job: &str) -> Self {
        self.job = job.to_string();
        self
    }

    /// Explicit `--lock-file`, overriding the per-job default
    pub fn lock_file(mut self, path: &Path) -> Self {
        self.lock_file = Some(path.to_path_buf());
        self
    }

    /// Options placed before `--`
    pub fn args(mut self, args: &[&str]) -> Self {
        self.options.extend(args.iter().map(|a| a.to_string()));
        self
    }

    /// The supervised command, placed after `--`
    pub fn command(mut self, command: &[&str]) -> Self {
        self.command = command.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Shorthand for `sh -c <script>`
    pub fn sh(self, script: &str) -> Self {
        self.command(&["sh", "-c", script])
    }

    fn build(&self) -> Command {
        let mut cmd = Command::cargo_bin("sisyphus").unwrap();
        cmd.args(&self.options).arg("-j").arg(&self.job);
        if let Some(lock_file) = &self.lock_file {
            cmd.arg("--lock-file").arg(lock_file);
        }
        if !self.command.is_empty() {
            cmd.arg("--").args(&self.command);
        }
        cmd.env_remove("SISYPHUS_WORKER").stdin(Stdio::null());
        cmd
    }

    pub fn run(&self) -> RunAssert {
        let started = Instant::now();
        let assert = self.build().assert();
        RunAssert {
            assert,
            elapsed: started.elapsed(),
        }
    }

    pub fn passes(&self) -> RunAssert {
        let run = self.run();
        RunAssert {
            assert: run.assert.success(),
            elapsed: run.elapsed,
        }
    }

    pub fn fails(&self) -> RunAssert {
        let run = self.run();
        RunAssert {
            assert: run.assert.failure(),
            elapsed: run.elapsed,
        }
    }

    /// Start in the background, output discarded
    pub fn spawn(&self) -> Child {
        self.build()
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap()
    }
}

pub struct RunAssert {
    assert: Assert,
    pub elapsed: Duration,
}

impl RunAssert {
    pub fn stdout_has(self, expected: &str) -> Self {
        Self {
            assert: self.assert.stdout(predicate::str::contains(expected)),
            elapsed: self.elapsed,
        }
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        let stdout = String::from_utf8_lossy(&self.assert.get_output().stdout).into_owned();
        similar_asserts::assert_eq!(stdout, expected);
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        Self {
            assert: self.assert.stderr(predicate::str::contains(expected)),
            elapsed: self.elapsed,
        }
    }

    pub fn stderr_lacks(self, unexpected: &str) -> Self {
        Self {
            assert: self
                .assert
                .stderr(predicate::str::contains(unexpected).not()),
            elapsed: self.elapsed,
        }
    }

    pub fn code(self, expected: i32) -> Self {
        Self {
            assert: self.assert.code(expected),
            elapsed: self.elapsed,
        }
    }
}

/// Texts of the log lines whose tags render exactly as `tags`, e.g. `{stdout}`
pub fn lines_tagged<'a>(log: &'a str, tags: &str) -> Vec<&'a str> {
    let marker = format!(":: {tags} >> ");
    log.lines()
        .filter_map(|line| line.split_once(&marker).map(|(_, text)| text))
        .collect()
}

/// Poll `condition` every 20ms for up to `max_ms`
pub fn wait_for(max_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    condition()
}
