// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message normalization into physical lines

use crate::failure::JobFailure;
use std::fmt;

/// Something that can be logged
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(String),
    /// Rendered as a traceback block plus a summary line, tagged `exc`
    Failure(JobFailure),
    /// Pre-rendered pretty-printed value
    Pretty(String),
}

impl Message {
    /// Pretty-print any `Debug` value
    pub fn pretty<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        Message::Pretty(format!("{value:#?}"))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Message::Failure(_))
    }

    /// Split into physical lines, dropping one blank trailing line
    pub fn lines(&self) -> Vec<String> {
        match self {
            Message::Text(text) | Message::Pretty(text) => split_lines(text),
            Message::Failure(failure) => split_lines(&failure.traceback()),
        }
    }
}

fn split_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    if lines.last().is_some_and(|last| last.trim().is_empty()) {
        lines.pop();
    }
    lines
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<&String> for Message {
    fn from(text: &String) -> Self {
        Message::Text(text.clone())
    }
}

impl From<JobFailure> for Message {
    fn from(failure: JobFailure) -> Self {
        Message::Failure(failure)
    }
}

impl From<&JobFailure> for Message {
    fn from(failure: &JobFailure) -> Self {
        Message::Failure(failure.clone())
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
