//! Job result specs
//!
//! Verify exit codes and the result lines of finished commands.

use crate::prelude::*;

#[test]
fn successful_command_exits_zero() {
    let temp = Project::empty();
    temp.sisyphus().sh("echo hello").passes();

    let log = temp.current_log(JOB);
    assert_eq!(lines_tagged(&log, "{stdout}"), ["hello"]);
    assert_eq!(
        lines_tagged(&log, "{sisyphus}{result}{ok}"),
        ["exit status 0"]
    );
    assert!(log.lines().last().unwrap().ends_with(">> exit status 0"));
}

#[test]
fn init_line_names_limit_and_pid() {
    let temp = Project::empty();
    temp.sisyphus().args(&["-m", "90s"]).sh("true").passes();

    let log = temp.current_log(JOB);
    let init = lines_tagged(&log, "{sisyphus}{init}");
    assert!(init[0].contains("(max time 1m 30s; pid "), "{init:?}");
}

#[test]
fn worker_announces_itself_when_forked() {
    let temp = Project::empty();
    temp.sisyphus().args(&["--fork"]).sh("true").passes();

    let log = temp.current_log(JOB);
    let init = lines_tagged(&log, "{sisyphus}{init}");
    assert_eq!(init.len(), 2);
    assert!(init[1].starts_with("worker process started (pid "));
}

#[test]
fn no_fork_runs_without_worker() {
    let temp = Project::empty();
    temp.sisyphus().args(&["--no-fork"]).sh("true").passes();

    let log = temp.current_log(JOB);
    assert_eq!(lines_tagged(&log, "{sisyphus}{init}").len(), 1);
}

#[test]
fn failing_command_exits_nonzero() {
    let temp = Project::empty();
    temp.sisyphus()
        .sh("echo boom >&2; exit 3")
        .fails()
        .code(1)
        .stderr_has("job failed");

    let log = temp.current_log(JOB);
    assert_eq!(lines_tagged(&log, "{stderr}"), ["boom"]);
    let exc = lines_tagged(&log, "{sisyphus}{exc}");
    let summary = exc.last().unwrap();
    assert!(summary.contains("ShellError"), "{summary}");
    assert!(summary.ends_with("sh exited with exit status: 3"), "{summary}");
    let fail = lines_tagged(&log, "{sisyphus}{result}{fail}");
    assert_eq!(fail.len(), 1, "{fail:?}");
    assert!(fail[0].starts_with("failed with "), "{fail:?}");
    assert!(fail[0].ends_with("sh exited with exit status: 3"), "{fail:?}");
    assert!(lines_tagged(&log, "{sisyphus}{result}{fail}{exc}").is_empty());
    assert!(lines_tagged(&log, "{sisyphus}{result}{ok}").is_empty());
}

#[test]
fn failing_command_without_fork_exits_nonzero() {
    let temp = Project::empty();
    temp.sisyphus()
        .args(&["--no-fork"])
        .sh("exit 7")
        .fails()
        .code(1);

    let log = temp.current_log(JOB);
    assert!(!lines_tagged(&log, "{sisyphus}{exc}").is_empty());
    assert_eq!(lines_tagged(&log, "{sisyphus}{result}{fail}").len(), 1);
}

#[test]
fn missing_program_is_a_failure() {
    let temp = Project::empty();
    temp.sisyphus()
        .command(&["/nonexistent/program"])
        .fails()
        .stderr_has("failed to start /nonexistent/program");
}
