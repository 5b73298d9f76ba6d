// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording mailer for tests

use super::{EmailReport, Mailer, ReportError};
use std::sync::{Arc, Mutex, PoisonError};

/// Mailer that records reports instead of sending them
#[derive(Debug, Clone, Default)]
pub struct FakeMailer {
    sent: Arc<Mutex<Vec<EmailReport>>>,
    fail: bool,
}

impl FakeMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails with a bad address
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailReport> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Mailer for FakeMailer {
    fn send(&self, email: &EmailReport) -> Result<(), ReportError> {
        if self.fail {
            return Err(ReportError::Address {
                address: email.to.clone(),
                source: lettre::address::AddressError::MissingParts,
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());
        Ok(())
    }
}
