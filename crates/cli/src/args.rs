// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line arguments

use clap::Parser;
use sisyphus_core::{ConfigError, EncodeErrors, Encoding, JobSettings};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "sisyphus",
    version,
    about = "Run a command as a supervised job: one instance at a time, bounded runtime, durable logs",
    after_help = "Example: sisyphus -p ACME -m 10m -- /usr/local/bin/backup.sh --full"
)]
pub struct Cli {
    /// Project name
    #[arg(short = 'p', long)]
    pub project: Option<String>,

    /// Job name [default: the command's file name]
    #[arg(short = 'j', long)]
    pub job: Option<String>,

    /// Maximum runtime, e.g. "90s", "1h 30m" or plain seconds [default: 5m]
    #[arg(short = 'm', long, value_parser = parse_duration)]
    pub maxtime: Option<Duration>,

    /// Run the command from a separate worker process [default]
    #[arg(long, overrides_with = "no_fork")]
    pub fork: bool,

    /// Run the command from the supervising process itself
    #[arg(long, overrides_with = "fork")]
    pub no_fork: bool,

    /// Log to a file [default]
    #[arg(long, overrides_with = "no_log_file")]
    pub log_file: bool,

    #[arg(long, overrides_with = "log_file")]
    pub no_log_file: bool,

    /// Also log to stdout
    #[arg(long, overrides_with = "no_log_stdout")]
    pub log_stdout: bool,

    #[arg(long, overrides_with = "log_stdout")]
    pub no_log_stdout: bool,

    /// Also log to stderr
    #[arg(long, overrides_with = "no_log_stderr")]
    pub log_stderr: bool,

    #[arg(long, overrides_with = "log_stderr")]
    pub no_log_stderr: bool,

    /// Remove log files older than this after a successful run [default: 30days]
    #[arg(long, value_parser = parse_duration)]
    pub keep_logs: Option<Duration>,

    /// Log encoding: utf-8, ascii or latin-1
    #[arg(long)]
    pub encoding: Option<Encoding>,

    /// Unencodable characters: strict, replace or ignore
    #[arg(long)]
    pub errors: Option<EncodeErrors>,

    /// Print a message to stderr when the maximum runtime is exceeded
    #[arg(long, overrides_with = "no_noisy_kills")]
    pub noisy_kills: bool,

    #[arg(long, overrides_with = "noisy_kills")]
    pub no_noisy_kills: bool,

    /// Post a desktop notification when the job finishes (macOS)
    #[arg(short = 'n', long, overrides_with = "no_notify")]
    pub notify: bool,

    #[arg(long, overrides_with = "notify")]
    pub no_notify: bool,

    /// Template for the log file path
    #[arg(long, value_name = "TEMPLATE")]
    pub log_file_name: Option<String>,

    /// Template for the "current" link path
    #[arg(long, value_name = "TEMPLATE")]
    pub log_link_name: Option<String>,

    /// Do not maintain a "current" link
    #[arg(long)]
    pub no_log_link: bool,

    /// Template for each log line
    #[arg(long, value_name = "TEMPLATE")]
    pub format_line: Option<String>,

    /// File locked to keep one instance running; overrides --lock-file-name
    #[arg(long)]
    pub lock_file: Option<PathBuf>,

    /// Template for the lock file path, one lock per project and job
    #[arg(long, value_name = "TEMPLATE")]
    pub lock_file_name: Option<String>,

    /// Label shown in the email report
    #[arg(long)]
    pub identifier: Option<String>,

    /// Sender of the email report
    #[arg(long, value_name = "ADDRESS")]
    pub from_email: Option<String>,

    /// Recipient of the email report; reports need sender, recipient and SMTP host
    #[arg(long, value_name = "ADDRESS")]
    pub to_email: Option<String>,

    #[arg(long, value_name = "HOST")]
    pub smtp_host: Option<String>,

    /// [default: 25]
    #[arg(long, value_name = "PORT")]
    pub smtp_port: Option<u16>,

    #[arg(long, value_name = "USER")]
    pub smtp_user: Option<String>,

    /// Prefer the `smtp_password` key of a --config file; flags show up in `ps`
    #[arg(long, value_name = "PASSWORD")]
    pub smtp_password: Option<String>,

    /// TOML file with job settings; flags take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Command to run, after `--`
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    /// Explicit-tier settings from flags
    pub fn settings(&self) -> JobSettings {
        JobSettings {
            project: self.project.clone(),
            job: self.job.clone(),
            max_runtime: self.maxtime,
            fork: flag(self.fork, self.no_fork),
            log_to_file: flag(self.log_file, self.no_log_file),
            log_to_stdout: flag(self.log_stdout, self.no_log_stdout),
            log_to_stderr: flag(self.log_stderr, self.no_log_stderr),
            keep_logs: self.keep_logs,
            encoding: self.encoding,
            errors: self.errors,
            noisy_kills: flag(self.noisy_kills, self.no_noisy_kills),
            notify: flag(self.notify, self.no_notify),
            log_file_name: self.log_file_name.clone(),
            log_link: flag(false, self.no_log_link),
            log_link_name: self.log_link_name.clone(),
            format_line: self.format_line.clone(),
            lock_file: self.lock_file.clone(),
            lock_file_name: self.lock_file_name.clone(),
            identifier: self.identifier.clone(),
            from_email: self.from_email.clone(),
            to_email: self.to_email.clone(),
            smtp_host: self.smtp_host.clone(),
            smtp_port: self.smtp_port,
            smtp_user: self.smtp_user.clone(),
            smtp_password: self.smtp_password.clone(),
        }
    }

    /// Instance-tier settings from `--config`, empty without one
    pub fn instance_settings(&self) -> Result<JobSettings, ConfigError> {
        match &self.config {
            Some(path) => JobSettings::from_toml_file(path),
            None => Ok(JobSettings::default()),
        }
    }
}

fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Plain seconds or a humantime duration
fn parse_duration(s: &str) -> Result<Duration, String> {
    if let Ok(secs) = s.trim().parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| format!("invalid duration `{s}`: {e}"))
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
