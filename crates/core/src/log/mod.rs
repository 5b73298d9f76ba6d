// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tagged multi-sink logger.
//!
//! ```text
//! log.tag("sisyphus").tag("result").tag("ok").log("done");
//! let _scope = log.with_prefix("[A] ");
//! log.task(Task::new().kind("file").name("a.txt"), || copy("a.txt"))?;
//! ```
//!
//! Each message is split into physical lines, every line is rendered through
//! the formatter's line template and written to every sink in order. Write
//! failures are traced and never abort the run.

mod message;
mod sink;
mod tag;
mod task;

pub use message::Message;
#[cfg(any(test, feature = "test-support"))]
pub use sink::MemorySink;
pub use sink::{FileSink, Sink, StreamSink};
pub use tag::TagNode;
pub use task::{Task, TaskErrors, TaskRecord};

use crate::failure::JobFailure;
use crate::format::{line_context, Formatter, LINE_TEMPLATE};
use crate::report::{Report, EMAIL_TAG};
use crate::run_info::RunInfo;
use chrono::Local;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, TryLockError};
use std::time::{Duration, Instant};

/// Tag added to every failure message
pub const EXC_TAG: &str = "exc";

const SINK_POLL: Duration = Duration::from_millis(5);

struct Shared {
    formatter: Formatter,
    info: RunInfo,
    sinks: Mutex<Vec<Box<dyn Sink>>>,
    prefixes: Mutex<Vec<String>>,
    tasks: Mutex<Vec<TaskRecord>>,
    report: OnceLock<Report>,
    root: Arc<TagNode>,
}

/// Root logger handle; clones share sinks, prefixes, tasks and the tag cache
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("project", &self.shared.info.project)
            .field("job", &self.shared.info.job)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// `formatter` must hold a [`LINE_TEMPLATE`]; lines fall back to raw text otherwise
    pub fn new(formatter: Formatter, info: RunInfo) -> Self {
        Self {
            shared: Arc::new(Shared {
                formatter,
                info,
                sinks: Mutex::new(Vec::new()),
                prefixes: Mutex::new(Vec::new()),
                tasks: Mutex::new(Vec::new()),
                report: OnceLock::new(),
                root: TagNode::root(),
            }),
        }
    }

    pub fn add_sink(&self, sink: Box<dyn Sink>) {
        self.lock_sinks().push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.lock_sinks().len()
    }

    /// Start collecting the email report; only the first report is kept
    pub fn collect_report(&self, report: Report) {
        if self.shared.report.set(report).is_err() {
            tracing::debug!("report already attached");
        }
    }

    pub fn report(&self) -> Option<&Report> {
        self.shared.report.get()
    }

    pub fn info(&self) -> &RunInfo {
        &self.shared.info
    }

    pub fn formatter(&self) -> &Formatter {
        &self.shared.formatter
    }

    /// Start a tag chain
    pub fn tag(&self, tag: &str) -> Tagged {
        Tagged {
            logger: self.clone(),
            node: self.shared.root.child(tag),
        }
    }

    /// Log without tags
    pub fn log(&self, message: impl Into<Message>) {
        self.emit(&self.shared.root, message.into());
    }

    /// Push `prefix` for every line logged until the guard drops
    pub fn with_prefix(&self, prefix: impl Into<String>) -> PrefixGuard {
        let mut prefixes = self.lock_prefixes();
        let depth = prefixes.len();
        prefixes.push(prefix.into());
        PrefixGuard {
            logger: self.clone(),
            depth,
        }
    }

    /// Concatenation of all active prefixes, outermost first
    pub fn prefix(&self) -> String {
        self.lock_prefixes().concat()
    }

    /// Open tasks, outermost first
    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.lock_tasks().clone()
    }

    /// Enter `task` until the returned scope ends or drops
    pub fn task_begin(&self, task: &Task) -> TaskScope {
        let mut tasks = self.lock_tasks();
        let depth = tasks.len();
        tasks.push(TaskRecord::begin(task));
        TaskScope {
            logger: self.clone(),
            depth,
            errors: task.errors,
            ended: false,
        }
    }

    /// Run `body` as `task`.
    ///
    /// A failure logs `failed with <summary>` inside the task, then follows
    /// the task's [`TaskErrors`]: `Raise` returns the failure, every other
    /// policy returns `Ok(None)`.
    pub fn task<T>(
        &self,
        task: Task,
        body: impl FnOnce() -> Result<T, JobFailure>,
    ) -> Result<Option<T>, JobFailure> {
        let scope = self.task_begin(&task);
        match body() {
            Ok(value) => {
                scope.end(None);
                Ok(Some(value))
            }
            Err(failure) => {
                scope.end(Some(&failure));
                if task.errors.propagates() {
                    Err(failure)
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn end_task(&self, depth: usize, failure: Option<&JobFailure>, errors: TaskErrors) {
        if let Some(record) = self.lock_tasks().get_mut(depth) {
            record.end_time = Some(Local::now());
            record.success = Some(failure.is_none());
        }
        if let Some(failure) = failure {
            if errors.logs_traceback() {
                self.log(failure);
            }
            self.log(format!("failed with {}", failure.summary()));
            if errors.emails() {
                if let Some(report) = self.report() {
                    report.add_failure(failure, self.tasks());
                }
            }
        }
        self.lock_tasks().truncate(depth);
    }

    fn emit(&self, node: &Arc<TagNode>, message: Message) {
        let (node, lines) = self.render(node, &message);
        self.collect(&node, &message);
        write_lines(&mut self.lock_sinks(), &lines);
    }

    /// Like `emit`, but gives up when the sinks stay busy for `wait`
    fn emit_within(&self, node: &Arc<TagNode>, message: Message, wait: Duration) -> bool {
        let (_, lines) = self.render(node, &message);
        match self.try_lock_sinks(wait) {
            Some(mut sinks) => {
                write_lines(&mut sinks, &lines);
                true
            }
            None => false,
        }
    }

    fn render(&self, node: &Arc<TagNode>, message: &Message) -> (Arc<TagNode>, Vec<String>) {
        let node = if message.is_failure() {
            node.child(EXC_TAG)
        } else {
            Arc::clone(node)
        };
        let time = Local::now();
        let prefix = self.prefix();
        let tasks = self.tasks();

        let lines = message
            .lines()
            .into_iter()
            .map(|line| {
                let context =
                    line_context(&self.shared.info, &time, &tasks, node.tags(), &prefix, &line);
                match self.shared.formatter.render(LINE_TEMPLATE, &context) {
                    Ok(rendered) => rendered,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to format log line");
                        format!("{prefix}{line}")
                    }
                }
            })
            .collect();
        (node, lines)
    }

    /// Hand `email` tagged messages to the report
    fn collect(&self, node: &TagNode, message: &Message) {
        let Some(report) = self.report() else {
            return;
        };
        if !node.contains(EMAIL_TAG) {
            return;
        }
        match message {
            Message::Failure(failure) => report.add_failure(failure, self.tasks()),
            _ => report.add_message(message.lines().join("\n"), node.tags().to_vec(), self.tasks()),
        }
    }

    fn lock_sinks(&self) -> MutexGuard<'_, Vec<Box<dyn Sink>>> {
        self.shared.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_lock_sinks(&self, wait: Duration) -> Option<MutexGuard<'_, Vec<Box<dyn Sink>>>> {
        let deadline = Instant::now() + wait;
        loop {
            match self.shared.sinks.try_lock() {
                Ok(sinks) => return Some(sinks),
                Err(TryLockError::Poisoned(e)) => return Some(e.into_inner()),
                Err(TryLockError::WouldBlock) if Instant::now() < deadline => {
                    std::thread::sleep(SINK_POLL);
                }
                Err(TryLockError::WouldBlock) => return None,
            }
        }
    }

    fn lock_prefixes(&self) -> MutexGuard<'_, Vec<String>> {
        self.shared.prefixes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<TaskRecord>> {
        self.shared.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn write_lines(sinks: &mut [Box<dyn Sink>], lines: &[String]) {
    for line in lines {
        for sink in sinks.iter_mut() {
            if let Err(e) = sink.write_line(line) {
                tracing::warn!(sink = sink.name(), error = %e, "failed to write log line");
            }
        }
    }
}

/// A logger bound to one cached tag combination
#[derive(Clone)]
pub struct Tagged {
    logger: Logger,
    node: Arc<TagNode>,
}

impl std::fmt::Debug for Tagged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Tagged").field(&self.node.tags()).finish()
    }
}

impl Tagged {
    pub fn tag(&self, tag: &str) -> Tagged {
        Tagged {
            logger: self.logger.clone(),
            node: self.node.child(tag),
        }
    }

    pub fn tags(&self) -> &[String] {
        self.node.tags()
    }

    pub fn log(&self, message: impl Into<Message>) {
        self.logger.emit(&self.node, message.into());
    }

    /// Log unless another thread keeps the sinks busy for longer than `wait`.
    ///
    /// Returns whether the message was written. Messages dropped here never
    /// reach the email report.
    pub fn try_log_for(&self, message: impl Into<Message>, wait: Duration) -> bool {
        self.logger.emit_within(&self.node, message.into(), wait)
    }

    /// Log each value in turn under the same tags
    pub fn log_all<M: Into<Message>>(&self, messages: impl IntoIterator<Item = M>) {
        for message in messages {
            self.log(message);
        }
    }

    /// True when both handles resolve to the same cached combination
    pub fn ptr_eq(a: &Tagged, b: &Tagged) -> bool {
        Arc::ptr_eq(&a.node, &b.node)
    }
}

/// Restores the previous prefix when dropped, including during unwinding
#[must_use = "the prefix is removed as soon as the guard is dropped"]
pub struct PrefixGuard {
    logger: Logger,
    depth: usize,
}

impl std::fmt::Debug for PrefixGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixGuard").field("depth", &self.depth).finish()
    }
}

impl Drop for PrefixGuard {
    fn drop(&mut self) {
        self.logger.lock_prefixes().truncate(self.depth);
    }
}

/// An open task; [`end`](Self::end) it with the outcome.
///
/// Dropped without `end`, the task closes as a success, or as a failure
/// while unwinding from a panic.
#[must_use = "the task ends as soon as the scope is dropped"]
pub struct TaskScope {
    logger: Logger,
    depth: usize,
    errors: TaskErrors,
    ended: bool,
}

impl TaskScope {
    /// Close the task; a failure is logged as `failed with <summary>`
    pub fn end(mut self, failure: Option<&JobFailure>) {
        self.ended = true;
        self.logger.end_task(self.depth, failure, self.errors);
    }
}

impl std::fmt::Debug for TaskScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScope").field("depth", &self.depth).finish()
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        let mut tasks = self.logger.lock_tasks();
        if let Some(record) = tasks.get_mut(self.depth) {
            record.end_time = Some(Local::now());
            record.success = Some(!std::thread::panicking());
        }
        tasks.truncate(self.depth);
    }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
