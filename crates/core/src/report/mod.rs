// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure report sent by email at the end of a run.
//!
//! While a [`Report`] is attached to the logger it collects every line tagged
//! `email`, every task failure whose policy asks for email, and the job's own
//! failure. A non-empty report becomes one [`EmailReport`]: a plain text and
//! an HTML body plus the entries as a JSON attachment.

#[cfg(any(test, feature = "test-support"))]
mod fake;
mod smtp;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeMailer;
pub use smtp::SmtpMailer;

use crate::config::EmailConfig;
use crate::failure::JobFailure;
use crate::format::format_timestamp;
use crate::log::TaskRecord;
use crate::run_info::RunInfo;
use chrono::{DateTime, Local};
use minijinja::{context, Environment};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Tag that routes a line into the report
pub const EMAIL_TAG: &str = "email";

const TEXT_TEMPLATE: &str = "report.txt";
const HTML_TEMPLATE: &str = "report.html";

const TEXT_BODY: &str = "\
{{ project }}/{{ job }}{% if identifier %} ({{ identifier }}){% endif %} on {{ user }}@{{ host }}
started {{ start_time }} (pid {{ pid }}, {{ script }})
{% for entry in entries %}
[{{ entry.time }}]{% for task in entry.tasks %} :: {{ task }}{% endfor %}{% if entry.tags %} :: {{ entry.tags|join('.') }}{% endif %}
{{ entry.text }}
{% if entry.traceback %}{{ entry.traceback }}
{% endif %}{% endfor %}";

const HTML_BODY: &str = "\
<html><body>
<h1>{{ project }}/{{ job }}{% if identifier %} ({{ identifier }}){% endif %}</h1>
<p>{{ user }}@{{ host }}, started {{ start_time }} (pid {{ pid }}, {{ script }})</p>
{% for entry in entries %}<div class=\"{{ 'exception' if entry.traceback else 'message' }}\">
<p>[{{ entry.time }}]{% for task in entry.tasks %} :: {{ task }}{% endfor %}{% if entry.tags %} :: {{ entry.tags|join('.') }}{% endif %}</p>
<p>{{ entry.text }}</p>
{% if entry.traceback %}<pre>{{ entry.traceback }}</pre>
{% endif %}</div>
{% endfor %}</body></html>
";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid email address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("invalid attachment type: {0}")]
    ContentType(#[source] lettre::message::header::ContentTypeErr),

    #[error("failed to build email: {0}")]
    Build(#[source] lettre::error::Error),

    #[error("failed to send email via {host}: {source}")]
    Send {
        host: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },

    #[error("failed to render email report: {0}")]
    Render(#[source] minijinja::Error),

    #[error("failed to encode email report: {0}")]
    Encode(#[source] serde_json::Error),
}

/// One collected item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReportEntry {
    Exception {
        time: DateTime<Local>,
        error: String,
        message: String,
        traceback: String,
        tasks: Vec<TaskRecord>,
    },
    Message {
        time: DateTime<Local>,
        message: String,
        tags: Vec<String>,
        tasks: Vec<TaskRecord>,
    },
}

impl ReportEntry {
    pub fn is_exception(&self) -> bool {
        matches!(self, ReportEntry::Exception { .. })
    }
}

/// Shared collector; clones append to the same entries
#[derive(Debug, Clone, Default)]
pub struct Report {
    entries: Arc<Mutex<Vec<ReportEntry>>>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_failure(&self, failure: &JobFailure, tasks: Vec<TaskRecord>) {
        self.push(ReportEntry::Exception {
            time: Local::now(),
            error: failure.type_name().to_string(),
            message: failure.message().to_string(),
            traceback: failure.traceback(),
            tasks,
        });
    }

    pub fn add_message(&self, message: String, tags: Vec<String>, tasks: Vec<TaskRecord>) {
        self.push(ReportEntry::Message {
            time: Local::now(),
            message,
            tags,
            tasks,
        });
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn push(&self, entry: ReportEntry) {
        self.lock().push(entry);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ReportEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A rendered report, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReport {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub attachment_name: String,
    pub json: String,
}

#[derive(Serialize)]
struct EntryView {
    time: String,
    tasks: Vec<String>,
    tags: Vec<String>,
    text: String,
    traceback: Option<String>,
}

impl From<&ReportEntry> for EntryView {
    fn from(entry: &ReportEntry) -> Self {
        match entry {
            ReportEntry::Exception {
                time,
                error,
                message,
                traceback,
                tasks,
            } => Self {
                time: format_timestamp(time),
                tasks: tasks.iter().map(TaskRecord::label).collect(),
                tags: Vec::new(),
                text: format!("{error}: {message}"),
                traceback: Some(traceback.clone()),
            },
            ReportEntry::Message {
                time,
                message,
                tags,
                tasks,
            } => Self {
                time: format_timestamp(time),
                tasks: tasks.iter().map(TaskRecord::label).collect(),
                tags: tags.clone(),
                text: message.clone(),
                traceback: None,
            },
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    project: &'a str,
    job: &'a str,
    identifier: Option<&'a str>,
    user: Option<&'a str>,
    host: Option<&'a str>,
    pid: u32,
    script: &'a str,
    start_time: DateTime<Local>,
    errors: &'a [ReportEntry],
}

impl EmailReport {
    pub fn render(
        config: &EmailConfig,
        identifier: Option<&str>,
        info: &RunInfo,
        entries: &[ReportEntry],
    ) -> Result<Self, ReportError> {
        let failures = entries.iter().filter(|e| e.is_exception()).count();
        let user = info.user.as_deref().unwrap_or("?");
        let host = info.host.as_deref().unwrap_or("?");
        let subject = match failures {
            0 => format!("{}/{} report for {user}@{host}", info.project, info.job),
            1 => format!("{}/{} failed for {user}@{host} with 1 error", info.project, info.job),
            n => format!("{}/{} failed for {user}@{host} with {n} errors", info.project, info.job),
        };

        let mut env = Environment::new();
        env.add_template(TEXT_TEMPLATE, TEXT_BODY)
            .map_err(ReportError::Render)?;
        env.add_template(HTML_TEMPLATE, HTML_BODY)
            .map_err(ReportError::Render)?;
        let views: Vec<EntryView> = entries.iter().map(EntryView::from).collect();
        let ctx = context! {
            project => info.project,
            job => info.job,
            identifier => identifier,
            user => user,
            host => host,
            pid => info.pid,
            script => info.script,
            start_time => format_timestamp(&info.start_time),
            entries => views,
        };
        let render = |name| {
            env.get_template(name)
                .and_then(|template| template.render(&ctx))
                .map_err(ReportError::Render)
        };

        let json = serde_json::to_string_pretty(&JsonReport {
            project: &info.project,
            job: &info.job,
            identifier,
            user: info.user.as_deref(),
            host: info.host.as_deref(),
            pid: info.pid,
            script: &info.script,
            start_time: info.start_time,
            errors: entries,
        })
        .map_err(ReportError::Encode)?;

        Ok(Self {
            from: config.from.clone(),
            to: config.to.clone(),
            subject,
            text: render(TEXT_TEMPLATE)?,
            html: render(HTML_TEMPLATE)?,
            attachment_name: format!("{}.{}.json", info.project, info.job),
            json,
        })
    }
}

/// Adapter trait for report delivery
pub trait Mailer: Send + Sync {
    fn send(&self, email: &EmailReport) -> Result<(), ReportError>;
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
