// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! sisyphus-core: supervise one job per invocation
//!
//! This crate provides:
//! - A single-instance lock on a stable file
//! - A tagged, multi-sink logger with prefix and task scopes
//! - Per-run log files with a "current" link and retention sweep
//! - A runtime supervisor with unsplit and worker-process modes
//! - An email report of failures and `email` tagged lines
//! - [`JobRunner`], which ties them together around a [`Job`]

pub mod config;
pub mod encoding;
pub mod error;
pub mod failure;
pub mod format;
pub mod job;
pub mod lock;
pub mod log;
pub mod logfile;
pub mod notify;
pub mod report;
pub mod run_info;
pub mod runner;
pub mod supervisor;

#[cfg(test)]
mod test_support;

// Re-exports
pub use config::{ConfigError, EmailConfig, JobConfig, JobConfigBuilder, JobSettings, Sinks};
pub use encoding::{EncodeErrors, Encoding, EncodingError};
pub use error::RunError;
pub use failure::JobFailure;
pub use format::{Formatter, TemplateError};
pub use job::Job;
pub use lock::{Acquire, LockError, SingleInstanceLock};
pub use log::{Logger, Message, PrefixGuard, Tagged, Task, TaskErrors, TaskRecord, TaskScope};
pub use logfile::{LogFile, LogFileError};
pub use notify::{NoOpNotifier, Notification, Notifier, NotifyError, TerminalNotifier};
pub use report::{EmailReport, Mailer, Report, ReportError, SmtpMailer};
pub use run_info::RunInfo;
pub use runner::{JobRunner, RunStatus};
pub use supervisor::{Supervisor, SupervisorError, Terminate};
