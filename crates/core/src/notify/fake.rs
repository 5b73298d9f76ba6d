// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording notifier for tests

use super::{Notification, Notifier, NotifyError};
use std::sync::{Arc, Mutex, PoisonError};

/// Recorded notifier call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Clear { group: String },
    Notify(Notification),
}

/// Notifier that records calls instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct FakeNotifier {
    calls: Arc<Mutex<Vec<NotifierCall>>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: NotifierCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Notifier for FakeNotifier {
    fn clear(&self, group: &str) -> Result<(), NotifyError> {
        self.record(NotifierCall::Clear {
            group: group.to_string(),
        });
        Ok(())
    }

    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.record(NotifierCall::Notify(notification.clone()));
        Ok(())
    }
}
