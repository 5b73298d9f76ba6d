// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unit of work a runner supervises

use crate::config::JobSettings;
use crate::failure::JobFailure;
use crate::log::Logger;
use std::path::PathBuf;

/// User-supplied job body.
///
/// ```ignore
/// struct Backup;
///
/// impl Job for Backup {
///     fn execute(&mut self, log: &Logger) -> Result<String, JobFailure> {
///         log.tag("backup").log("copying");
///         let copied = copy_all()?;
///         Ok(format!("copied {copied} files"))
///     }
/// }
/// ```
pub trait Job {
    /// Do the work; the returned summary is logged as the `ok` result
    fn execute(&mut self, log: &Logger) -> Result<String, JobFailure>;

    /// Compensating cleanup after `execute` failed or panicked
    fn failed(&mut self, _log: &Logger) {}

    /// Class-tier configuration defaults
    fn settings(&self) -> JobSettings {
        JobSettings::default()
    }

    /// Default job name, the short type name
    fn name(&self) -> String
    where
        Self: Sized,
    {
        short_type_name::<Self>().to_string()
    }

    /// Lock resource used when no lock file is configured; without one the
    /// lock file template names a lock per project and job
    fn lock_resource(&self) -> Option<PathBuf> {
        None
    }

    /// File whose text is captured as the run's `source`
    fn source_file(&self) -> Option<PathBuf> {
        None
    }
}

/// `a::b::Foo<c::Bar>` becomes `Foo`
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
