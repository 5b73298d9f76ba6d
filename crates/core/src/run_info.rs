// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time snapshot of a run, taken when the lock is acquired

use crate::config::JobConfig;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

/// Source files larger than this are not captured
const MAX_SOURCE_BYTES: u64 = 1024 * 1024;

/// Immutable facts about the current run.
///
/// Serves as the template context for every rendered path and line, and is
/// handed to the worker process in split mode so both sides agree on the
/// start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub project: String,
    pub job: String,
    pub start_time: DateTime<Local>,
    pub pid: u32,
    pub executable: PathBuf,
    /// File name of the executable
    pub script: String,
    pub lock_resource: PathBuf,
    #[serde(with = "humantime_serde")]
    pub max_runtime: Duration,
    pub user: Option<String>,
    pub host: Option<String>,
    /// Text of the job's source file, when it is a readable text script
    pub source: Option<String>,
    /// Output of `crontab -l`, when available
    pub crontab: Option<String>,
}

impl RunInfo {
    /// Snapshot the current process
    pub fn capture(config: &JobConfig, lock_resource: &Path) -> Self {
        let executable = current_executable();
        let script = executable
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            project: config.project.clone(),
            job: config.job.clone(),
            start_time: Local::now(),
            pid: std::process::id(),
            executable,
            script,
            lock_resource: lock_resource.to_path_buf(),
            max_runtime: config.max_runtime,
            user: std::env::var("USER")
                .or_else(|_| std::env::var("LOGNAME"))
                .ok(),
            host: hostname::get()
                .ok()
                .map(|host| host.to_string_lossy().into_owned()),
            source: None,
            crontab: read_crontab(),
        }
    }

    /// Capture the text of `path` as the job's source
    pub fn with_source(mut self, path: &Path) -> Self {
        self.source = read_source(path);
        self
    }
}

/// Path of the running executable, falling back to `argv[0]`
pub fn current_executable() -> PathBuf {
    std::env::current_exe()
        .ok()
        .or_else(|| std::env::args_os().next().map(PathBuf::from))
        .unwrap_or_default()
}

fn read_source(path: &Path) -> Option<String> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() || metadata.len() > MAX_SOURCE_BYTES {
        return None;
    }
    let bytes = std::fs::read(path).ok()?;
    String::from_utf8(bytes).ok()
}

fn read_crontab() -> Option<String> {
    let output = Command::new("crontab")
        .arg("-l")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

#[cfg(test)]
#[path = "run_info_tests.rs"]
mod tests;
