// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime bound enforcement.
//!
//! Unsplit mode arms the deadline in the executing process itself; on expiry
//! the kill line is logged and the process exits at once, without unwinding
//! the job. A job stuck inside a sink write cannot hold the exit back: the
//! kill line waits at most [`KILL_LOG_WAIT`] for the sinks.
//!
//! Split mode starts a worker process and only waits for it; on expiry the
//! worker's process group receives `SIGTERM`, the kill line is logged and
//! the monitor exits. A monitor killed outright takes the deadline with it,
//! but the worker keeps the shared lock until it exits.

mod deadline;
mod worker;

pub use deadline::{Deadline, ProcessExit, Terminate};
pub use worker::{WorkerHandoff, WORKER_ENV};

use crate::log::Logger;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Exit code used after a timeout kill
pub const KILL_EXIT_CODE: i32 = 1;

/// How long the kill line waits for sinks busy with another thread
pub const KILL_LOG_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to arm deadline timer: {0}")]
    Timer(#[source] std::io::Error),

    #[error("failed to encode worker handoff: {0}")]
    EncodeHandoff(#[source] serde_json::Error),

    #[error("invalid worker handoff in SISYPHUS_WORKER: {0}")]
    DecodeHandoff(#[source] serde_json::Error),

    #[error("failed to start worker process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed waiting for worker process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("worker process failed ({status})")]
    WorkerFailed { status: ExitStatus },
}

/// Enforces the maximum runtime of one run
#[derive(Clone)]
pub struct Supervisor {
    log: Logger,
    max_runtime: Duration,
    noisy_kills: bool,
    terminator: Arc<dyn Terminate>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("max_runtime", &self.max_runtime)
            .field("noisy_kills", &self.noisy_kills)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(log: Logger, max_runtime: Duration, noisy_kills: bool) -> Self {
        Self {
            log,
            max_runtime,
            noisy_kills,
            terminator: Arc::new(ProcessExit),
        }
    }

    /// Replace how the process ends after a kill
    pub fn with_terminator(mut self, terminator: Arc<dyn Terminate>) -> Self {
        self.terminator = terminator;
        self
    }

    /// Run `body` in this process under the deadline
    pub fn run_unsplit<T>(&self, body: impl FnOnce() -> T) -> Result<T, SupervisorError> {
        let deadline = self.arm(None)?;
        let output = body();
        deadline.disarm();
        Ok(output)
    }

    /// Start `worker` and wait for it under the deadline.
    ///
    /// The worker logs its own result, so nothing is logged here unless the
    /// deadline fires.
    pub fn run_monitor(&self, mut worker: Command) -> Result<(), SupervisorError> {
        let mut child = worker.spawn().map_err(SupervisorError::Spawn)?;
        let pid = child.id();
        tracing::debug!(pid, "worker started");

        let deadline = self.arm(Some(pid)).inspect_err(|_| {
            let _ = child.kill();
        })?;
        let status = child.wait().map_err(SupervisorError::Wait)?;
        deadline.disarm();

        tracing::debug!(pid, %status, "worker exited");
        if status.success() {
            Ok(())
        } else {
            Err(SupervisorError::WorkerFailed { status })
        }
    }

    fn arm(&self, worker: Option<u32>) -> Result<Deadline, SupervisorError> {
        let log = self.log.clone();
        let max_runtime = self.max_runtime;
        let noisy_kills = self.noisy_kills;
        let terminator = Arc::clone(&self.terminator);

        Deadline::arm(max_runtime, move || {
            let limit = humantime::format_duration(max_runtime);
            let message = match worker {
                Some(pid) => {
                    signal_group(pid);
                    format!("Terminated worker after {limit}")
                }
                None => format!("Terminated after {limit}"),
            };
            if noisy_kills {
                eprintln!(
                    "maximum runtime {limit} exceeded (pid {})",
                    std::process::id()
                );
            }
            let written = log
                .tag("sisyphus")
                .tag("result")
                .tag("kill")
                .try_log_for(message, KILL_LOG_WAIT);
            if !written {
                tracing::warn!("log sinks busy, terminating without the kill line");
            }
            terminator.terminate(KILL_EXIT_CODE)
        })
        .map_err(SupervisorError::Timer)
    }
}

/// Send `SIGTERM` to the process group led by `pid`
fn signal_group(pid: u32) {
    let Ok(raw) = i32::try_from(pid) else {
        tracing::warn!(pid, "worker pid out of range");
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGTERM) {
        tracing::warn!(pid, error = %e, "failed to signal worker");
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
