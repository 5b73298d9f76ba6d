//! CLI argument specs

use crate::prelude::*;

#[test]
fn command_is_required() {
    let temp = Project::empty();
    temp.sisyphus().fails().code(2).stderr_has("COMMAND");
}

#[test]
fn invalid_duration_is_rejected() {
    let temp = Project::empty();
    temp.sisyphus()
        .args(&["-m", "soon"])
        .sh("true")
        .fails()
        .code(2)
        .stderr_has("invalid duration");
}

#[test]
fn invalid_template_fails_before_running() {
    let temp = Project::empty();
    let marker = temp.path().join("ran");
    temp.sisyphus()
        .args(&["--format-line", "{{ line "])
        .sh(&format!("touch {}", marker.display()))
        .fails()
        .code(1)
        .stderr_has("sisyphus: ");

    assert!(!marker.exists());
}

#[test]
fn config_file_supplies_settings() {
    let temp = Project::empty();
    let config = temp.file("job.toml", "job = \"from-file\"\nmax_runtime = \"2m\"\n");

    temp.sisyphus()
        .job("from-flag")
        .args(&["--config", config.to_str().unwrap()])
        .sh("true")
        .passes();

    let log = temp.current_log("from-flag");
    let init = lines_tagged(&log, "{sisyphus}{init}");
    assert!(init[0].contains("(max time 2m; pid "), "{init:?}");
}

#[test]
fn unknown_config_key_is_an_error() {
    let temp = Project::empty();
    let config = temp.file("job.toml", "max_runtim = \"2m\"\n");

    temp.sisyphus()
        .args(&["--config", config.to_str().unwrap()])
        .sh("true")
        .fails()
        .stderr_has("max_runtim");
}
