// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level orchestration of one supervised run.
//!
//! Order of events: acquire the lock, snapshot the run, create the log file,
//! log the `init` line, run the job under the supervisor, send the email
//! report, sweep old logs after a success, close the log and release the
//! lock. Resources are released by drop on every exit path.

use crate::config::{JobConfig, JobSettings};
use crate::error::RunError;
use crate::failure::JobFailure;
use crate::format::{
    format_elapsed, lock_context, Formatter, TemplateError, LINE_TEMPLATE, LOCK_FILE_TEMPLATE,
    LOG_FILE_TEMPLATE, LOG_LINK_TEMPLATE,
};
use crate::job::Job;
use crate::lock::{Acquire, SingleInstanceLock};
use crate::log::{Logger, StreamSink};
use crate::logfile::{self, LogFile};
use crate::notify::{NoOpNotifier, Notification, Notifier, TerminalNotifier};
use crate::report::{EmailReport, Mailer, Report, SmtpMailer};
use crate::run_info::RunInfo;
use crate::supervisor::{ProcessExit, Supervisor, Terminate, WorkerHandoff};
use chrono::Local;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

/// How a run ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Another instance holds the lock; nothing was done
    Skipped,
    /// The job body ran in this process and returned `summary`
    Completed { summary: String },
    /// A worker process ran the job body and succeeded
    Delegated,
}

/// Runs one [`Job`] under lock, deadline and logging
pub struct JobRunner<J: Job> {
    job: J,
    instance: JobSettings,
    explicit: JobSettings,
    notifier: Option<Box<dyn Notifier>>,
    mailer: Option<Box<dyn Mailer>>,
    terminator: Arc<dyn Terminate>,
}

impl<J: Job> std::fmt::Debug for JobRunner<J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRunner")
            .field("instance", &self.instance)
            .field("explicit", &self.explicit)
            .finish_non_exhaustive()
    }
}

impl<J: Job> JobRunner<J> {
    pub fn new(job: J) -> Self {
        Self {
            job,
            instance: JobSettings::default(),
            explicit: JobSettings::default(),
            notifier: None,
            mailer: None,
            terminator: Arc::new(ProcessExit),
        }
    }

    /// Instance-tier settings, e.g. from a config file
    pub fn instance(mut self, settings: JobSettings) -> Self {
        self.instance = settings;
        self
    }

    /// Explicit-tier settings, e.g. from command-line flags
    pub fn explicit(mut self, settings: JobSettings) -> Self {
        self.explicit = settings;
        self
    }

    /// Notifier used when notifications are enabled; `terminal-notifier` otherwise
    pub fn notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Mailer for the email report; SMTP to the configured host otherwise
    pub fn mailer(mut self, mailer: Box<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn terminator(mut self, terminator: Arc<dyn Terminate>) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    /// Resolve the configuration: defaults, class, instance, explicit
    pub fn config(&self) -> Result<JobConfig, RunError> {
        Ok(JobConfig::builder(self.job.name())
            .class(self.job.settings())
            .instance(self.instance.clone())
            .explicit(self.explicit.clone())
            .build()?)
    }

    pub fn run(&mut self) -> Result<RunStatus, RunError> {
        let config = self.config()?;
        if let Some(handoff) = WorkerHandoff::from_env()? {
            return self.run_worker(&config, handoff);
        }

        let formatter = build_formatter(&config)?;
        let resource = self.lock_resource(&config, &formatter)?;
        let lock = match SingleInstanceLock::try_acquire(&resource)? {
            Acquire::Acquired(lock) => lock,
            Acquire::AlreadyHeld => {
                tracing::info!(resource = %resource.display(), "already running, skipping");
                return Ok(RunStatus::Skipped);
            }
        };

        let mut info = RunInfo::capture(&config, &resource);
        if let Some(source) = self.job.source_file() {
            info = info.with_source(&source);
        }
        let logfile = if config.sinks.file {
            Some(LogFile::create(&formatter, &info)?)
        } else {
            None
        };
        let log = build_logger(formatter, info, &config, logfile.as_ref())?;
        log.tag("sisyphus").tag("init").log(format!(
            "{} (max time {}; pid {})",
            log.info().script,
            humantime::format_duration(config.max_runtime),
            log.info().pid
        ));

        let supervisor = Supervisor::new(log.clone(), config.max_runtime, config.noisy_kills)
            .with_terminator(Arc::clone(&self.terminator));
        let status = if config.fork {
            let handoff = WorkerHandoff {
                run_info: log.info().clone(),
                log_path: logfile.as_ref().map(|f| f.path().to_path_buf()),
                link_path: logfile.as_ref().and_then(|f| f.link().map(|l| l.to_path_buf())),
            };
            supervisor.run_monitor(handoff.command(lock.share()?)?)?;
            RunStatus::Delegated
        } else {
            let summary = supervisor.run_unsplit(|| self.execute(&log, &config))??;
            if let Some(logfile) = &logfile {
                logfile.sweep(config.keep_logs, &log);
            }
            RunStatus::Completed { summary }
        };

        drop(log);
        drop(logfile);
        lock.release();
        Ok(status)
    }

    /// Explicit lock file, then the job's own resource, then the template
    fn lock_resource(&self, config: &JobConfig, formatter: &Formatter) -> Result<PathBuf, RunError> {
        if let Some(path) = config.lock_file.clone().or_else(|| self.job.lock_resource()) {
            return Ok(path);
        }
        let rendered =
            formatter.render(LOCK_FILE_TEMPLATE, &lock_context(&config.project, &config.job))?;
        Ok(logfile::resolve_path(&rendered)?)
    }

    /// Worker side of split mode: the monitor holds the deadline and shares
    /// the lock through stdin
    fn run_worker(
        &mut self,
        config: &JobConfig,
        handoff: WorkerHandoff,
    ) -> Result<RunStatus, RunError> {
        let logfile = handoff
            .log_path
            .as_deref()
            .map(|path| LogFile::reopen(path, handoff.link_path.as_deref()))
            .transpose()?;
        let formatter = build_formatter(config)?;
        let log = build_logger(formatter, handoff.run_info, config, logfile.as_ref())?;
        log.tag("sisyphus")
            .tag("init")
            .log(format!("worker process started (pid {})", std::process::id()));

        let summary = self.execute(&log, config)?;
        if let Some(logfile) = &logfile {
            logfile.sweep(config.keep_logs, &log);
        }
        Ok(RunStatus::Completed { summary })
    }

    /// Run the job body, log its result, notify and send the report.
    ///
    /// A failure is logged twice: its traceback under `sisyphus`, then a
    /// one-line `failed with` under `sisyphus.result.fail`. Panics are
    /// logged like failures, then resumed.
    fn execute(&mut self, log: &Logger, config: &JobConfig) -> Result<String, RunError> {
        let terminal = TerminalNotifier::default();
        let notifier: &dyn Notifier = match (&self.notifier, config.notify) {
            (_, false) => &NoOpNotifier,
            (Some(notifier), true) => notifier.as_ref(),
            (None, true) => &terminal,
        };
        let group = log.info().script.clone();
        if let Err(e) = notifier.clear(&group) {
            tracing::warn!(error = %e, "failed to clear notifications");
        }

        let job = &mut self.job;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| job.execute(log)));
        let (result, failure) = match &outcome {
            Ok(Ok(summary)) => {
                log.tag("sisyphus").tag("result").tag("ok").log(summary);
                (summary.clone(), None)
            }
            Ok(Err(failure)) => (
                format!("failed with {}", failure.summary()),
                Some(failure.clone()),
            ),
            Err(payload) => {
                let failure = JobFailure::from_panic(&**payload);
                (format!("failed with {}", failure.summary()), Some(failure))
            }
        };
        if let Some(failure) = &failure {
            log.tag("sisyphus").log(failure);
            log.tag("sisyphus").tag("result").tag("fail").log(&result);
            if let Some(report) = log.report() {
                report.add_failure(failure, log.tasks());
            }
            self.job.failed(log);
        }

        let info = log.info();
        let elapsed = Local::now()
            .signed_duration_since(info.start_time)
            .to_std()
            .unwrap_or_default();
        let notification = Notification::new(format!("{} {}", info.project, info.job), result)
            .with_subtitle(format!("finished after {}", format_elapsed(elapsed)))
            .with_group(group);
        if let Err(e) = notifier.notify(&notification) {
            tracing::warn!(error = %e, "failed to send notification");
        }
        self.send_report(log, config);

        match outcome {
            Ok(Ok(summary)) => Ok(summary),
            Ok(Err(failure)) => Err(RunError::Job(failure)),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Mail the collected report, if there is one; failures are only logged
    fn send_report(&self, log: &Logger, config: &JobConfig) {
        let (Some(email_config), Some(report)) = (&config.email, log.report()) else {
            return;
        };
        if report.is_empty() {
            return;
        }

        let smtp = SmtpMailer::new(email_config);
        let mailer: &dyn Mailer = self.mailer.as_deref().unwrap_or(&smtp);
        let sent = EmailReport::render(
            email_config,
            config.identifier.as_deref(),
            log.info(),
            &report.entries(),
        )
        .and_then(|email| mailer.send(&email));

        let tagged = log.tag("sisyphus").tag("report");
        match sent {
            Ok(()) => tagged.log(format!("Sent email report to {}", email_config.to)),
            Err(e) => tagged.log(JobFailure::from(e)),
        }
    }
}

fn build_formatter(config: &JobConfig) -> Result<Formatter, TemplateError> {
    let mut formatter = Formatter::new();
    formatter.add_template(LOCK_FILE_TEMPLATE, &config.lock_file_name)?;
    formatter.add_template(LOG_FILE_TEMPLATE, &config.log_file_name)?;
    if let Some(link) = &config.log_link_name {
        formatter.add_template(LOG_LINK_TEMPLATE, link)?;
    }
    formatter.add_template(LINE_TEMPLATE, &config.format_line)?;
    Ok(formatter)
}

fn build_logger(
    formatter: Formatter,
    info: RunInfo,
    config: &JobConfig,
    logfile: Option<&LogFile>,
) -> Result<Logger, RunError> {
    let log = Logger::new(formatter, info);
    if config.email.is_some() {
        log.collect_report(Report::new());
    }
    if let Some(logfile) = logfile {
        log.add_sink(Box::new(logfile.sink(config.encoding, config.errors)?));
    }
    if config.sinks.stdout {
        log.add_sink(Box::new(StreamSink::stdout(config.encoding, config.errors)));
    }
    if config.sinks.stderr {
        log.add_sink(Box::new(StreamSink::stderr(config.encoding, config.errors)));
    }
    Ok(log)
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
