//! Logging specs
//!
//! Verify sinks, line formatting and the current-log link.

use crate::prelude::*;

#[test]
fn output_lines_are_tagged_by_stream() {
    let temp = Project::empty();
    temp.sisyphus()
        .sh("printf 'a\\nb\\n'; echo oops >&2")
        .passes();

    let log = temp.current_log(JOB);
    assert_eq!(lines_tagged(&log, "{stdout}"), ["a", "b"]);
    assert_eq!(lines_tagged(&log, "{stderr}"), ["oops"]);
}

#[test]
fn lines_carry_time_and_elapsed() {
    let temp = Project::empty();
    temp.sisyphus().sh("echo hello").passes();

    let log = temp.current_log(JOB);
    let line = log.lines().find(|l| l.ends_with(">> hello")).unwrap();
    assert!(line.starts_with('['), "{line}");
    assert!(line.contains("]=[t+"), "{line}");
}

#[test]
fn log_stdout_echoes_lines() {
    let temp = Project::empty();
    temp.sisyphus()
        .args(&["--log-stdout"])
        .sh("echo hello")
        .passes()
        .stdout_has(":: {stdout} >> hello")
        .stdout_has(":: {sisyphus}{result}{ok} >> exit status 0");
}

#[test]
fn log_stderr_without_file() {
    let temp = Project::empty();
    temp.sisyphus()
        .args(&["--no-log-file", "--log-stderr"])
        .sh("echo hello")
        .passes()
        .stderr_has(":: {stdout} >> hello");

    assert!(!temp.path().join("logs").exists());
}

#[test]
fn custom_line_template() {
    let temp = Project::empty();
    temp.sisyphus()
        .args(&["--format-line", "{{ tags|join('.') }}|{{ line }}"])
        .sh("echo hello")
        .passes();

    let log = temp.current_log(JOB);
    let lines: Vec<&str> = log.lines().collect();
    assert!(lines.contains(&"stdout|hello"), "{log}");
    assert_eq!(lines.last(), Some(&"sisyphus.result.ok|exit status 0"));
}

#[test]
fn ascii_encoding_replaces_other_characters() {
    let temp = Project::empty();
    temp.sisyphus()
        .args(&["--encoding", "ascii", "--errors", "replace"])
        .sh("echo café")
        .passes();

    let log = temp.current_log(JOB);
    assert_eq!(lines_tagged(&log, "{stdout}"), ["caf?"]);
}

#[test]
fn link_follows_latest_run() {
    let temp = Project::empty();
    temp.sisyphus().sh("echo first").passes();
    temp.sisyphus().sh("echo second").passes();

    let files = temp.log_files(JOB);
    assert_eq!(files.len(), 2);
    let target = std::fs::read_link(temp.current_link(JOB)).unwrap();
    assert_eq!(target.file_name(), files[1].file_name());

    let log = temp.current_log(JOB);
    assert_eq!(lines_tagged(&log, "{stdout}"), ["second"]);
}

#[test]
fn no_log_link_skips_link() {
    let temp = Project::empty();
    temp.sisyphus().args(&["--no-log-link"]).sh("true").passes();

    assert_eq!(temp.log_files(JOB).len(), 1);
    assert!(!temp.current_link(JOB).exists());
}
