//! Log retention specs
//!
//! Verify that successful runs remove expired log files.

use crate::prelude::*;

#[test]
fn success_removes_expired_logs() {
    let temp = Project::empty();
    let old = temp.aged_log(JOB, "old.log", 40);
    let recent = temp.aged_log(JOB, "recent.log", 20);
    let new = temp.aged_log(JOB, "new.log", 5);

    temp.sisyphus().sh("true").passes();

    assert!(!old.exists());
    assert!(recent.exists());
    assert!(new.exists());

    let log = temp.current_log(JOB);
    let info = lines_tagged(&log, "{sisyphus}{info}");
    assert_eq!(info[0], "Removing logfiles older than 30days");
    assert_eq!(info.len(), 2);
    assert!(info[1].ends_with("old.log"), "{info:?}");
}

#[test]
fn keep_logs_sets_cutoff() {
    let temp = Project::empty();
    let recent = temp.aged_log(JOB, "recent.log", 20);
    let new = temp.aged_log(JOB, "new.log", 5);

    temp.sisyphus()
        .args(&["--keep-logs", "10days"])
        .sh("true")
        .passes();

    assert!(!recent.exists());
    assert!(new.exists());
}

#[test]
fn failure_keeps_expired_logs() {
    let temp = Project::empty();
    let old = temp.aged_log(JOB, "old.log", 90);

    temp.sisyphus().sh("exit 1").fails();

    assert!(old.exists());
}

#[test]
fn current_log_survives_sweep() {
    let temp = Project::empty();
    temp.aged_log(JOB, "old.log", 40);

    temp.sisyphus().args(&["--keep-logs", "0"]).sh("true").passes();

    assert!(temp.current_link(JOB).exists());
    assert_eq!(temp.log_files(JOB).len(), 1);
}
