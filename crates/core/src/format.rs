// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jinja-style templates for log paths and log lines.
//!
//! Templates are rendered with minijinja in strict mode, so a typo in a
//! variable name fails when the template is rendered instead of silently
//! producing an empty path segment.
//!
//! Available variables: `project`, `job`, `pid`, `executable`, `script`,
//! `user`, `host`, `start_time`, `max_runtime`, `source`, `crontab`.
//! Line templates additionally see `time`, `elapsed`, `tasks`, `tags`,
//! `prefix` and `line`. Each entry of `tasks` has `type`, `name`, `index`,
//! `count` and a ready-made `label`. The `strftime(fmt)` filter reformats
//! `time` or `start_time`. The lock file template is rendered before the run
//! starts and sees only `project` and `job`.

use crate::log::TaskRecord;
use crate::run_info::RunInfo;
use chrono::{DateTime, Local, NaiveDateTime};
use minijinja::{Environment, ErrorKind, UndefinedBehavior, Value};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;
use thiserror::Error;

/// Timestamp layout used for `time` and `start_time`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub const LOG_FILE_TEMPLATE: &str = "log_file_name";
pub const LOG_LINK_TEMPLATE: &str = "log_link_name";
pub const LINE_TEMPLATE: &str = "format_line";
pub const LOCK_FILE_TEMPLATE: &str = "lock_file_name";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid template {name}: {source}")]
    Syntax {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to render template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Compiled set of named templates
#[derive(Debug)]
pub struct Formatter {
    env: Environment<'static>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_filter("strftime", strftime);
        Self { env }
    }

    /// Compile `source` under `name`, replacing any previous template
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), TemplateError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
            .map_err(|source| TemplateError::Syntax {
                name: name.to_string(),
                source,
            })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    pub fn render(&self, name: &str, context: &Value) -> Result<String, TemplateError> {
        let render_error = |source| TemplateError::Render {
            name: name.to_string(),
            source,
        };
        let template = self.env.get_template(name).map_err(render_error)?;
        template.render(context).map_err(render_error)
    }

    /// Render with only the run-level variables
    pub fn render_run(&self, name: &str, info: &RunInfo) -> Result<String, TemplateError> {
        self.render(name, &Value::from_serialize(run_context(info)))
    }
}

/// Variables shared by every template of a run
pub fn run_context(info: &RunInfo) -> BTreeMap<&'static str, Value> {
    let mut ctx = BTreeMap::new();
    ctx.insert("project", Value::from(info.project.as_str()));
    ctx.insert("job", Value::from(info.job.as_str()));
    ctx.insert("pid", Value::from(info.pid));
    ctx.insert(
        "executable",
        Value::from(info.executable.display().to_string()),
    );
    ctx.insert("script", Value::from(info.script.as_str()));
    ctx.insert("user", Value::from(info.user.clone()));
    ctx.insert("host", Value::from(info.host.clone()));
    ctx.insert("start_time", Value::from(format_timestamp(&info.start_time)));
    ctx.insert(
        "max_runtime",
        Value::from(humantime::format_duration(info.max_runtime).to_string()),
    );
    ctx.insert("source", Value::from(info.source.clone()));
    ctx.insert("crontab", Value::from(info.crontab.clone()));
    ctx
}

/// Variables known before the lock is taken
pub fn lock_context(project: &str, job: &str) -> Value {
    let mut ctx = BTreeMap::new();
    ctx.insert("project", Value::from(project));
    ctx.insert("job", Value::from(job));
    Value::from_serialize(&ctx)
}

/// Variables for rendering a single log line
pub fn line_context(
    info: &RunInfo,
    time: &DateTime<Local>,
    tasks: &[TaskRecord],
    tags: &[String],
    prefix: &str,
    line: &str,
) -> Value {
    let mut ctx = run_context(info);
    ctx.insert("time", Value::from(format_timestamp(time)));
    let elapsed = time
        .signed_duration_since(info.start_time)
        .to_std()
        .unwrap_or_default();
    ctx.insert("elapsed", Value::from(format_elapsed(elapsed)));
    ctx.insert("tasks", Value::from(tasks.iter().map(task_value).collect::<Vec<_>>()));
    ctx.insert("tags", Value::from(tags.to_vec()));
    ctx.insert("prefix", Value::from(prefix));
    ctx.insert("line", Value::from(line));
    Value::from_serialize(&ctx)
}

fn task_value(task: &TaskRecord) -> Value {
    let mut ctx = BTreeMap::new();
    ctx.insert("type", Value::from(task.kind.clone()));
    ctx.insert("name", Value::from(task.name.clone()));
    ctx.insert("index", Value::from(task.index));
    ctx.insert("count", Value::from(task.count));
    ctx.insert("label", Value::from(task.label()));
    Value::from_serialize(&ctx)
}

pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Compact duration: `3.250s`, `02:03.250m` or `1:02:03.250h`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = (total % 60) as f64 + f64::from(elapsed.subsec_micros()) / 1_000_000.0;

    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:06.3}h")
    } else if mins > 0 {
        format!("{mins:02}:{secs:06.3}m")
    } else {
        format!("{secs:.3}s")
    }
}

fn strftime(value: String, format: String) -> Result<String, minijinja::Error> {
    let parsed = NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT).map_err(|e| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("strftime expects a timestamp, got {value:?}: {e}"),
        )
    })?;
    let mut out = String::new();
    write!(out, "{}", parsed.format(&format)).map_err(|_| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid strftime format {format:?}"),
        )
    })?;
    Ok(out)
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
