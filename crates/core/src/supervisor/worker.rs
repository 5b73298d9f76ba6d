// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor to worker handoff for split mode.
//!
//! The worker is the same executable started again with the handoff in
//! [`WORKER_ENV`]. It carries the run snapshot and the log paths, so the
//! worker reopens the monitor's log file instead of rendering a new one.

use super::SupervisorError;
use crate::run_info::{current_executable, RunInfo};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Environment variable marking a process as a worker
pub const WORKER_ENV: &str = "SISYPHUS_WORKER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerHandoff {
    pub run_info: RunInfo,
    pub log_path: Option<PathBuf>,
    pub link_path: Option<PathBuf>,
}

impl WorkerHandoff {
    pub fn encode(&self) -> Result<String, SupervisorError> {
        serde_json::to_string(self).map_err(SupervisorError::EncodeHandoff)
    }

    pub fn decode(raw: &str) -> Result<Self, SupervisorError> {
        serde_json::from_str(raw).map_err(SupervisorError::DecodeHandoff)
    }

    /// Take the handoff out of the environment, if this process is a worker.
    ///
    /// The variable is removed so processes started by the job body are not
    /// mistaken for workers.
    pub fn from_env() -> Result<Option<Self>, SupervisorError> {
        let Some(raw) = std::env::var_os(WORKER_ENV) else {
            return Ok(None);
        };
        std::env::remove_var(WORKER_ENV);
        Self::decode(&raw.to_string_lossy()).map(Some)
    }

    /// Command that re-executes this program as the worker.
    ///
    /// The worker leads its own process group so a timeout kill reaches
    /// everything it started. `lock` becomes the worker's stdin: the worker
    /// shares the monitor's lock and keeps it if the monitor dies first.
    pub fn command(&self, lock: File) -> Result<Command, SupervisorError> {
        let mut command = Command::new(current_executable());
        command
            .args(std::env::args_os().skip(1))
            .env(WORKER_ENV, self.encode()?)
            .stdin(Stdio::from(lock))
            .process_group(0);
        Ok(command)
    }
}
