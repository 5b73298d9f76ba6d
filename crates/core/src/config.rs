// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job configuration and its layered override chain.
//!
//! A [`JobConfig`] is resolved once per invocation from up to three
//! [`JobSettings`] layers, applied on top of built-in defaults in a fixed
//! order: class (the job type's own defaults), instance (e.g. a config
//! file), explicit (e.g. command-line flags). Later layers win.

use crate::encoding::{EncodeErrors, Encoding};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default log file template, one file per run
pub const DEFAULT_LOG_FILE_NAME: &str = "~/.sisyphus/{{ project }}/{{ job }}/{{ start_time|strftime(\"%Y-%m-%d-%H-%M-%S-%6f\") }}.sisyphuslog";

/// Default "current" pointer template
pub const DEFAULT_LOG_LINK_NAME: &str = "~/.sisyphus/{{ project }}/{{ job }}/current.sisyphuslog";

/// Default lock file template; kept outside the log directory so the sweep never sees it
pub const DEFAULT_LOCK_FILE_NAME: &str = "~/.sisyphus/{{ project }}/{{ job }}.lock";

/// Default per-line template
pub const DEFAULT_FORMAT_LINE: &str = "[{{ time }}]=[t+{{ elapsed }}]{% for task in tasks %} :: {{ task.label }}{% endfor %}{% if tags %} :: {% for tag in tags %}{{ \"{\" ~ tag ~ \"}\" }}{% endfor %}{% endif %} >> {{ prefix }}{{ line }}";

pub const DEFAULT_PROJECT: &str = "default";
pub const DEFAULT_MAX_RUNTIME: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_KEEP_LOGS: Duration = Duration::from_secs(30 * 24 * 60 * 60);
pub const DEFAULT_SMTP_PORT: u16 = 25;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("maximum runtime must be greater than zero")]
    ZeroRuntime,

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Which outputs receive log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sinks {
    pub file: bool,
    pub stdout: bool,
    pub stderr: bool,
}

/// Delivery of the failure report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub from: String,
    pub to: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

/// One layer of optional overrides.
///
/// Deserializes from TOML, with durations in humantime syntax:
///
/// ```toml
/// project = "ACME.Backup"
/// max_runtime = "90s"
/// keep_logs = "14days"
/// to_email = "ops@example.com"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobSettings {
    pub project: Option<String>,
    pub job: Option<String>,
    #[serde(with = "humantime_serde")]
    pub max_runtime: Option<Duration>,
    pub fork: Option<bool>,
    pub log_to_file: Option<bool>,
    pub log_to_stdout: Option<bool>,
    pub log_to_stderr: Option<bool>,
    #[serde(with = "humantime_serde")]
    pub keep_logs: Option<Duration>,
    pub encoding: Option<Encoding>,
    pub errors: Option<EncodeErrors>,
    pub noisy_kills: Option<bool>,
    pub notify: Option<bool>,
    pub log_file_name: Option<String>,
    pub log_link: Option<bool>,
    pub log_link_name: Option<String>,
    pub format_line: Option<String>,
    pub lock_file: Option<PathBuf>,
    pub lock_file_name: Option<String>,
    /// Extra label shown in the email report
    pub identifier: Option<String>,
    pub from_email: Option<String>,
    pub to_email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl JobSettings {
    /// Load a settings layer from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply every value set in `upper` on top of `self`
    pub fn overlay(&mut self, upper: &JobSettings) {
        fn take<T: Clone>(slot: &mut Option<T>, upper: &Option<T>) {
            if let Some(value) = upper {
                *slot = Some(value.clone());
            }
        }

        take(&mut self.project, &upper.project);
        take(&mut self.job, &upper.job);
        take(&mut self.max_runtime, &upper.max_runtime);
        take(&mut self.fork, &upper.fork);
        take(&mut self.log_to_file, &upper.log_to_file);
        take(&mut self.log_to_stdout, &upper.log_to_stdout);
        take(&mut self.log_to_stderr, &upper.log_to_stderr);
        take(&mut self.keep_logs, &upper.keep_logs);
        take(&mut self.encoding, &upper.encoding);
        take(&mut self.errors, &upper.errors);
        take(&mut self.noisy_kills, &upper.noisy_kills);
        take(&mut self.notify, &upper.notify);
        take(&mut self.log_file_name, &upper.log_file_name);
        take(&mut self.log_link, &upper.log_link);
        take(&mut self.log_link_name, &upper.log_link_name);
        take(&mut self.format_line, &upper.format_line);
        take(&mut self.lock_file, &upper.lock_file);
        take(&mut self.lock_file_name, &upper.lock_file_name);
        take(&mut self.identifier, &upper.identifier);
        take(&mut self.from_email, &upper.from_email);
        take(&mut self.to_email, &upper.to_email);
        take(&mut self.smtp_host, &upper.smtp_host);
        take(&mut self.smtp_port, &upper.smtp_port);
        take(&mut self.smtp_user, &upper.smtp_user);
        take(&mut self.smtp_password, &upper.smtp_password);
    }
}

/// Fully resolved, immutable job configuration
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub project: String,
    pub job: String,
    pub max_runtime: Duration,
    /// Run the job body in a separate worker process
    pub fork: bool,
    pub sinks: Sinks,
    /// Log files older than this are removed after a successful run
    pub keep_logs: Duration,
    pub encoding: Encoding,
    pub errors: EncodeErrors,
    /// Print a notice to stderr when the deadline kills the job
    pub noisy_kills: bool,
    pub notify: bool,
    pub log_file_name: String,
    pub log_link_name: Option<String>,
    pub format_line: String,
    /// Explicit lock resource; wins over [`lock_file_name`](Self::lock_file_name)
    pub lock_file: Option<PathBuf>,
    /// Template for the lock file path, rendered with `project` and `job`
    pub lock_file_name: String,
    pub identifier: Option<String>,
    /// Set only when sender, recipient and SMTP host are all configured
    pub email: Option<EmailConfig>,
}

impl JobConfig {
    pub fn builder(default_job_name: impl Into<String>) -> JobConfigBuilder {
        JobConfigBuilder::new(default_job_name)
    }
}

/// Resolves a [`JobConfig`] from defaults and override layers
#[derive(Debug, Clone, Default)]
pub struct JobConfigBuilder {
    default_job_name: String,
    class: JobSettings,
    instance: JobSettings,
    explicit: JobSettings,
}

impl JobConfigBuilder {
    pub fn new(default_job_name: impl Into<String>) -> Self {
        Self {
            default_job_name: default_job_name.into(),
            ..Self::default()
        }
    }

    /// Defaults declared by the job type
    pub fn class(mut self, settings: JobSettings) -> Self {
        self.class = settings;
        self
    }

    /// Per-instance values, e.g. from a config file
    pub fn instance(mut self, settings: JobSettings) -> Self {
        self.instance = settings;
        self
    }

    /// Caller overrides, e.g. command-line flags
    pub fn explicit(mut self, settings: JobSettings) -> Self {
        self.explicit = settings;
        self
    }

    pub fn build(self) -> Result<JobConfig, ConfigError> {
        let mut merged = self.class;
        merged.overlay(&self.instance);
        merged.overlay(&self.explicit);

        let project = merged
            .project
            .unwrap_or_else(|| DEFAULT_PROJECT.to_string());
        let job = merged.job.unwrap_or(self.default_job_name);
        if project.is_empty() {
            return Err(ConfigError::Empty("project name"));
        }
        if job.is_empty() {
            return Err(ConfigError::Empty("job name"));
        }

        let max_runtime = merged.max_runtime.unwrap_or(DEFAULT_MAX_RUNTIME);
        if max_runtime.is_zero() {
            return Err(ConfigError::ZeroRuntime);
        }

        let log_link_name = if merged.log_link.unwrap_or(true) {
            Some(
                merged
                    .log_link_name
                    .unwrap_or_else(|| DEFAULT_LOG_LINK_NAME.to_string()),
            )
        } else {
            None
        };

        let email = match (merged.from_email, merged.to_email, merged.smtp_host) {
            (Some(from), Some(to), Some(smtp_host)) => Some(EmailConfig {
                from,
                to,
                smtp_host,
                smtp_port: merged.smtp_port.unwrap_or(DEFAULT_SMTP_PORT),
                smtp_user: merged.smtp_user,
                smtp_password: merged.smtp_password,
            }),
            _ => None,
        };

        Ok(JobConfig {
            project,
            job,
            max_runtime,
            fork: merged.fork.unwrap_or(true),
            sinks: Sinks {
                file: merged.log_to_file.unwrap_or(true),
                stdout: merged.log_to_stdout.unwrap_or(false),
                stderr: merged.log_to_stderr.unwrap_or(false),
            },
            keep_logs: merged.keep_logs.unwrap_or(DEFAULT_KEEP_LOGS),
            encoding: merged.encoding.unwrap_or_default(),
            errors: merged.errors.unwrap_or_default(),
            noisy_kills: merged.noisy_kills.unwrap_or(false),
            notify: merged.notify.unwrap_or(false),
            log_file_name: merged
                .log_file_name
                .unwrap_or_else(|| DEFAULT_LOG_FILE_NAME.to_string()),
            log_link_name,
            format_line: merged
                .format_line
                .unwrap_or_else(|| DEFAULT_FORMAT_LINE.to_string()),
            lock_file: merged.lock_file,
            lock_file_name: merged
                .lock_file_name
                .unwrap_or_else(|| DEFAULT_LOCK_FILE_NAME.to_string()),
            identifier: merged.identifier,
            email,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
