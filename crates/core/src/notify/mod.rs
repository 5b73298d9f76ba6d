// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notifications for job start and finish

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifier, NotifierCall};

use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Default install location of the `terminal-notifier` app bundle
pub const TERMINAL_NOTIFIER: &str =
    "/Applications/terminal-notifier.app/Contents/MacOS/terminal-notifier";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    Status {
        program: PathBuf,
        status: std::process::ExitStatus,
    },
}

/// A notification to display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub subtitle: Option<String>,
    pub message: String,
    /// Notifications in one group replace each other
    pub group: Option<String>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            message: message.into(),
            group: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Adapter trait for notification delivery
pub trait Notifier: Send + Sync {
    /// Remove earlier notifications of `group`
    fn clear(&self, group: &str) -> Result<(), NotifyError>;

    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn clear(&self, _group: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// macOS Notification Center via `terminal-notifier`
#[derive(Debug, Clone)]
pub struct TerminalNotifier {
    program: PathBuf,
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new(TERMINAL_NOTIFIER)
    }
}

impl TerminalNotifier {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_args(notification: &Notification) -> Vec<String> {
        let mut args = vec!["-title".to_string(), notification.title.clone()];
        if let Some(subtitle) = &notification.subtitle {
            args.push("-subtitle".to_string());
            args.push(subtitle.clone());
        }
        args.push("-message".to_string());
        args.push(notification.message.clone());
        if let Some(group) = &notification.group {
            args.push("-group".to_string());
            args.push(group.clone());
        }
        args
    }

    fn run(&self, args: &[String]) -> Result<(), NotifyError> {
        let status = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|source| NotifyError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(NotifyError::Status {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

impl Notifier for TerminalNotifier {
    fn clear(&self, group: &str) -> Result<(), NotifyError> {
        self.run(&["-remove".to_string(), group.to_string()])
    }

    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.run(&Self::build_args(notification))
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
