// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for unit tests

use crate::config::JobSettings;
use crate::run_info::RunInfo;
use chrono::{Local, TimeZone};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn sample_info() -> RunInfo {
    RunInfo {
        project: "ACME.FooBar".to_string(),
        job: "Fetch".to_string(),
        start_time: Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap(),
        pid: 4242,
        executable: PathBuf::from("/usr/local/bin/fetch"),
        script: "fetch".to_string(),
        lock_resource: PathBuf::from("/usr/local/bin/fetch"),
        max_runtime: Duration::from_secs(180),
        user: Some("walter".to_string()),
        host: Some("cronhost".to_string()),
        source: None,
        crontab: None,
    }
}

/// Settings that keep every file inside `dir` and run unsplit
pub fn settings_in(dir: &Path) -> JobSettings {
    JobSettings {
        project: Some("ACME".to_string()),
        fork: Some(false),
        log_file_name: Some(format!(
            "{}/{{{{ project }}}}/{{{{ job }}}}/{{{{ start_time|strftime('%H-%M-%S-%6f') }}}}.log",
            dir.display()
        )),
        log_link_name: Some(format!(
            "{}/{{{{ project }}}}/{{{{ job }}}}/current.log",
            dir.display()
        )),
        lock_file: Some(dir.join("job.lock")),
        ..JobSettings::default()
    }
}
