//! Maximum runtime specs
//!
//! Verify that overrunning jobs are cut off and the kill is logged once.

use crate::prelude::*;
use std::time::Duration;

const KILL: &str = "{sisyphus}{result}{kill}";

#[test]
fn forked_worker_is_terminated_at_deadline() {
    let temp = Project::empty();
    let run = temp
        .sisyphus()
        .args(&["--fork", "-m", "1"])
        .command(&["sleep", "30"])
        .fails()
        .code(1);

    assert!(run.elapsed < Duration::from_millis(1500), "{:?}", run.elapsed);
    let log = temp.current_log(JOB);
    assert_eq!(lines_tagged(&log, KILL), ["Terminated worker after 1s"]);
    assert!(lines_tagged(&log, "{sisyphus}{result}{ok}").is_empty());
}

#[test]
fn unsplit_job_is_terminated_at_deadline() {
    let temp = Project::empty();
    let run = temp
        .sisyphus()
        .args(&["--no-fork", "-m", "1"])
        .command(&["sleep", "3"])
        .fails()
        .code(1);

    assert!(run.elapsed < Duration::from_millis(1500), "{:?}", run.elapsed);
    let log = temp.current_log(JOB);
    assert_eq!(lines_tagged(&log, KILL), ["Terminated after 1s"]);
}

#[test]
fn noisy_kills_report_on_stderr() {
    let temp = Project::empty();
    temp.sisyphus()
        .args(&["--noisy-kills", "-m", "1"])
        .command(&["sleep", "30"])
        .fails()
        .stderr_has("maximum runtime 1s exceeded (pid ");
}

#[test]
fn quiet_kills_by_default() {
    let temp = Project::empty();
    temp.sisyphus()
        .args(&["-m", "1"])
        .command(&["sleep", "30"])
        .fails()
        .stderr_lacks("maximum runtime");
}

#[test]
fn job_within_limit_is_not_killed() {
    let temp = Project::empty();
    temp.sisyphus().args(&["-m", "5"]).sh("sleep 0.2").passes();

    let log = temp.current_log(JOB);
    assert!(lines_tagged(&log, KILL).is_empty());
}
