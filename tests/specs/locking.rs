//! Single-instance specs
//!
//! Verify that a second run of the same job exits quietly, and that
//! different jobs never contend for one lock.

use crate::prelude::*;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

#[test]
fn second_instance_skips_while_first_runs() {
    let temp = Project::empty();
    let mut first = temp
        .sisyphus()
        .args(&["-m", "2"])
        .command(&["sleep", "30"])
        .spawn();

    let started = wait_for(SPEC_WAIT_MAX_MS, || temp.current_link(JOB).exists());
    assert!(started, "first instance never started logging");

    let marker = temp.path().join("ran");
    temp.sisyphus()
        .sh(&format!("touch {}", marker.display()))
        .passes()
        .stdout_eq("");

    assert!(!marker.exists());
    assert_eq!(temp.log_files(JOB).len(), 1);

    let status = first.wait().unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn different_jobs_run_side_by_side() {
    let temp = Project::empty();
    let mut backup = temp
        .sisyphus()
        .job("backup")
        .args(&["-m", "2"])
        .command(&["sleep", "30"])
        .spawn();
    let started = wait_for(SPEC_WAIT_MAX_MS, || temp.current_link("backup").exists());
    assert!(started, "backup never started logging");

    // Same interpreter as the running job, different job name
    let marker = temp.path().join("report-ran");
    temp.sisyphus()
        .job("report")
        .command(&["sh", "-c", &format!("touch {}", marker.display())])
        .passes();

    assert!(marker.exists());
    assert!(temp.lock_path("backup").exists());
    assert!(temp.lock_path("report").exists());

    backup.wait().unwrap();
}

#[test]
fn lock_is_released_after_each_run() {
    let temp = Project::empty();
    temp.sisyphus().sh("echo one").passes();
    temp.sisyphus().sh("echo two").passes();

    assert_eq!(temp.log_files(JOB).len(), 2);
}

#[test]
fn explicit_lock_file_is_shared_across_jobs() {
    let temp = Project::empty();
    let lock = temp.path().join("nested/dir/shared.lock");
    let mut first = temp
        .sisyphus()
        .job("first")
        .lock_file(&lock)
        .args(&["-m", "2"])
        .command(&["sleep", "30"])
        .spawn();
    let started = wait_for(SPEC_WAIT_MAX_MS, || temp.current_link("first").exists());
    assert!(started, "first instance never started logging");
    assert!(lock.exists());

    temp.sisyphus()
        .job("second")
        .lock_file(&lock)
        .sh("true")
        .passes();
    assert!(!temp.log_dir("second").exists());
    assert!(!temp.lock_path("first").exists());

    first.wait().unwrap();
}

#[test]
fn killed_holder_releases_lock() {
    let temp = Project::empty();
    let mut first = temp
        .sisyphus()
        .args(&["--no-fork"])
        .command(&["sleep", "5"])
        .spawn();
    let started = wait_for(SPEC_WAIT_MAX_MS, || temp.current_link(JOB).exists());
    assert!(started, "first instance never started logging");

    kill(Pid::from_raw(first.id() as i32), Signal::SIGKILL).unwrap();
    first.wait().unwrap();

    temp.sisyphus().sh("true").passes();
    assert_eq!(temp.log_files(JOB).len(), 2);
}

#[test]
fn worker_keeps_lock_after_monitor_is_killed() {
    let temp = Project::empty();
    let started = temp.path().join("started");
    let finished = temp.path().join("finished");
    let mut monitor = temp
        .sisyphus()
        .args(&["--fork"])
        .sh(&format!(
            "touch {}; sleep 3; touch {}",
            started.display(),
            finished.display()
        ))
        .spawn();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || started.exists()),
        "worker never started"
    );

    kill(Pid::from_raw(monitor.id() as i32), Signal::SIGKILL).unwrap();
    monitor.wait().unwrap();

    let marker = temp.path().join("second-ran");
    temp.sisyphus()
        .sh(&format!("touch {}", marker.display()))
        .passes()
        .stdout_eq("");
    assert!(!marker.exists(), "second instance ran beside the orphaned worker");

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || finished.exists()),
        "orphaned worker did not finish"
    );
    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        temp.sisyphus()
            .sh(&format!("touch {}", marker.display()))
            .passes();
        marker.exists()
    }));
}
