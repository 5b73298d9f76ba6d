// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot deadline timer

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Ends the process from the deadline thread
pub trait Terminate: Send + Sync + 'static {
    fn terminate(&self, code: i32) -> !;
}

/// Exits immediately without unwinding the interrupted job
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl Terminate for ProcessExit {
    fn terminate(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}

/// Runs a handler on a background thread once `after` elapses.
///
/// Dropping the deadline before it fires disarms it. Once armed it cannot be
/// extended.
#[derive(Debug)]
pub struct Deadline {
    disarm: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Deadline {
    pub fn arm<F>(after: Duration, on_expire: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("sisyphus-deadline".to_string())
            .spawn(move || match rx.recv_timeout(after) {
                Err(RecvTimeoutError::Timeout) => {
                    tracing::debug!(?after, "deadline expired");
                    on_expire();
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            })?;
        tracing::debug!(?after, "deadline armed");
        Ok(Self {
            disarm: Some(tx),
            thread: Some(thread),
        })
    }

    pub fn disarm(self) {}
}

impl Drop for Deadline {
    fn drop(&mut self) {
        // Closing the channel wakes the timer thread early
        self.disarm.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("deadline handler panicked");
            }
        }
    }
}
