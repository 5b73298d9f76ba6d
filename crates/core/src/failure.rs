// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Captured job body failures.
//!
//! Any `std::error::Error` converts into a [`JobFailure`] through `?`,
//! keeping the concrete type name, the message, the `source()` chain and a
//! backtrace (when `RUST_BACKTRACE` enables capture). Panics convert via
//! [`JobFailure::from_panic`]; type-erased errors, which cannot take part in
//! `?`, via [`JobFailure::from_boxed`] and [`JobFailure::from_anyhow`].

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

/// An error raised by the job body, rendered for the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    type_name: String,
    message: String,
    causes: Vec<String>,
    backtrace: Option<String>,
}

impl JobFailure {
    /// A failure with an explicit type label and message
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            causes: Vec::new(),
            backtrace: capture_backtrace(),
        }
    }

    /// A failure from a panic payload caught at the job boundary
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            String::new()
        };
        Self {
            type_name: "panic".to_string(),
            message,
            causes: Vec::new(),
            backtrace: None,
        }
    }

    /// A failure from a type-erased error; the concrete type is unknown
    pub fn from_boxed(err: Box<dyn std::error::Error + Send + Sync + 'static>) -> Self {
        Self {
            type_name: "dyn Error".to_string(),
            message: err.to_string(),
            causes: source_chain(err.source()),
            backtrace: capture_backtrace(),
        }
    }

    /// A failure from an `anyhow::Error`; its context layers become causes
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        Self {
            type_name: "anyhow::Error".to_string(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
            backtrace: capture_backtrace(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Display strings of the `source()` chain, outermost first
    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    /// One-line summary: `type: message`
    pub fn summary(&self) -> String {
        if self.message.is_empty() {
            self.type_name.clone()
        } else {
            format!("{}: {}", self.type_name, self.message)
        }
    }

    /// Multi-line traceback block followed by the summary line
    pub fn traceback(&self) -> String {
        let mut out = String::new();
        match &self.backtrace {
            Some(backtrace) => {
                out.push_str("Backtrace (most recent call first):\n");
                out.push_str(backtrace.trim_end());
                out.push('\n');
            }
            None => out.push_str("Backtrace not captured (set RUST_BACKTRACE=1)\n"),
        }
        for cause in &self.causes {
            out.push_str("caused by: ");
            out.push_str(cause);
            out.push('\n');
        }
        out.push_str(&self.summary());
        out
    }
}

impl<E> From<E> for JobFailure
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self {
            type_name: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            causes: source_chain(err.source()),
            backtrace: capture_backtrace(),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

fn source_chain(mut source: Option<&(dyn std::error::Error + 'static)>) -> Vec<String> {
    let mut causes = Vec::new();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

fn capture_backtrace() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "failure_tests.rs"]
mod tests;
