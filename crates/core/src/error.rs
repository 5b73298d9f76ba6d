// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level run errors

use crate::config::ConfigError;
use crate::failure::JobFailure;
use crate::format::TemplateError;
use crate::lock::LockError;
use crate::logfile::LogFileError;
use crate::supervisor::SupervisorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    LogFile(#[from] LogFileError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    /// Already logged as the `fail` result
    #[error("job failed: {0}")]
    Job(JobFailure),
}

impl RunError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Supervisor(SupervisorError::WorkerFailed { status }) => {
                status.code().unwrap_or(1)
            }
            _ => 1,
        }
    }
}
