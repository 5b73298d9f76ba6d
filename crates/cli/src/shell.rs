// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job body that runs an external command.
//!
//! Output lines are logged as they arrive, tagged `stdout` or `stderr`.

use sisyphus_core::{Job, JobFailure, Logger, Tagged};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed reading output of {program}: {source}")]
    Output {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    CommandFailed { program: String, status: ExitStatus },
}

/// Runs `program` with `args` and waits for it
#[derive(Debug, Clone)]
pub struct ShellJob {
    program: String,
    args: Vec<String>,
}

impl ShellJob {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    async fn run(&self, log: &Logger) -> Result<ExitStatus, ShellError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ShellError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        tracing::debug!(program = %self.program, pid = ?child.id(), "command started");

        let stdout = forward(child.stdout.take(), log.tag("stdout"));
        let stderr = forward(child.stderr.take(), log.tag("stderr"));
        let (status, stdout, stderr) = tokio::join!(child.wait(), stdout, stderr);

        let output_error = |source| ShellError::Output {
            program: self.program.clone(),
            source,
        };
        stdout.map_err(output_error)?;
        stderr.map_err(output_error)?;
        status.map_err(output_error)
    }
}

impl Job for ShellJob {
    fn execute(&mut self, log: &Logger) -> Result<String, JobFailure> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ShellError::Runtime)?;
        let status = runtime.block_on(self.run(log))?;

        if !status.success() {
            return Err(ShellError::CommandFailed {
                program: self.program.clone(),
                status,
            }
            .into());
        }
        Ok(format!("exit status {}", status.code().unwrap_or_default()))
    }

    /// File name of the program
    fn name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.clone())
    }

    /// The program file, captured as the run's source
    fn source_file(&self) -> Option<PathBuf> {
        resolve_program(&self.program)
    }
}

/// Log each line from `reader` until it closes
async fn forward<R>(reader: Option<R>, tagged: Tagged) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(());
    };
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        tagged.log(line.trim_end_matches(['\n', '\r']));
    }
}

/// Path of `program`, searching `PATH` for bare names
fn resolve_program(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        return std::path::absolute(program).ok();
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
