// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Nested task scopes.
//!
//! Every line logged while a task is open carries the stack of open tasks,
//! outermost first, in the `tasks` variable of the line template.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// What a failed task does with its failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskErrors {
    /// Hand the failure back to the caller
    #[default]
    Raise,
    /// Swallow it after the `failed with` line
    Ignore,
    /// Swallow it, logging the traceback
    Log,
    /// Swallow it, logging the traceback and adding it to the email report
    LogEmail,
    /// Swallow it, adding it to the email report
    Email,
}

impl TaskErrors {
    pub fn propagates(self) -> bool {
        self == TaskErrors::Raise
    }

    pub fn logs_traceback(self) -> bool {
        matches!(self, TaskErrors::Log | TaskErrors::LogEmail)
    }

    pub fn emails(self) -> bool {
        matches!(self, TaskErrors::LogEmail | TaskErrors::Email)
    }
}

/// Description of a task to enter.
///
/// ```ignore
/// log.task(Task::new().kind("file").name(&path).index(i, Some(n)), || copy(&path))?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub index: Option<usize>,
    pub count: Option<usize>,
    pub errors: TaskErrors,
}

impl Task {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Zero-based position in a batch of `count`
    pub fn index(mut self, index: usize, count: Option<usize>) -> Self {
        self.index = Some(index);
        self.count = count;
        self
    }

    pub fn errors(mut self, errors: TaskErrors) -> Self {
        self.errors = errors;
        self
    }
}

/// An entered task, with its outcome once it has ended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub index: Option<usize>,
    pub count: Option<usize>,
    pub start_time: DateTime<Local>,
    pub end_time: Option<DateTime<Local>>,
    pub success: Option<bool>,
}

impl TaskRecord {
    pub(crate) fn begin(task: &Task) -> Self {
        Self {
            kind: task.kind.clone(),
            name: task.name.clone(),
            index: task.index,
            count: task.count,
            start_time: Local::now(),
            end_time: None,
            success: None,
        }
    }

    /// `type name (index+1/count)`, or `?` for a task with no description
    pub fn label(&self) -> String {
        let mut label = [self.kind.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        match (self.index, self.count) {
            (Some(index), count) => {
                if !label.is_empty() {
                    label.push(' ');
                }
                let position = match count {
                    Some(count) => format!("({}/{count})", index + 1),
                    None => format!("({})", index + 1),
                };
                label.push_str(&position);
            }
            (None, _) if label.is_empty() => label.push('?'),
            (None, _) => {}
        }
        label
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
