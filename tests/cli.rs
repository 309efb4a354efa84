use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn write_templates(dir: &std::path::Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("indexHeader.txt"), "+++\nversion = \"{{ version }}\"\n+++\n").unwrap();
    fs::write(dir.join("contents.md"), "# {{ sourceName }}\n").unwrap();
}

#[test]
fn help_lists_all_options() {
    let mut cmd = Command::cargo_bin("docs-mirror").expect("binary exists");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--config")
                .and(predicate::str::contains("--root"))
                .and(predicate::str::contains("--template-dir"))
                .and(predicate::str::contains("--max-in-flight"))
                .and(predicate::str::contains("ACCESS_TOKEN")),
        );
}

#[test]
fn access_token_argument_is_required() {
    let mut cmd = Command::cargo_bin("docs-mirror").expect("binary exists");
    cmd.assert().failure();
}

/// An empty source list runs the whole orchestration loop without touching
/// the network and exits zero.
#[test]
fn run_with_no_sources_succeeds() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("sources.json");
    fs::write(&config, "[]").unwrap();
    let templates = dir.path().join("templates");
    write_templates(&templates);

    let mut cmd = Command::cargo_bin("docs-mirror").expect("binary exists");
    cmd.arg("--config")
        .arg(&config)
        .arg("--root")
        .arg(dir.path().join("content"))
        .arg("--template-dir")
        .arg(&templates)
        .arg("")
        .assert()
        .success();
}

/// Template problems surface before any fetch starts and fail the run.
#[test]
fn missing_template_fails_before_fetching() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("sources.json");
    fs::write(&config, "[]").unwrap();
    let templates = dir.path().join("templates");
    fs::create_dir_all(&templates).unwrap();
    fs::write(templates.join("indexHeader.txt"), "+++\n+++\n").unwrap();
    // contents.md deliberately absent.

    let mut cmd = Command::cargo_bin("docs-mirror").expect("binary exists");
    cmd.arg("--config")
        .arg(&config)
        .arg("--root")
        .arg(dir.path().join("content"))
        .arg("--template-dir")
        .arg(&templates)
        .arg("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("contents.md"));
}

#[test]
fn unreadable_config_fails_the_run() {
    let dir = tempdir().unwrap();
    let templates = dir.path().join("templates");
    write_templates(&templates);

    let mut cmd = Command::cargo_bin("docs-mirror").expect("binary exists");
    cmd.arg("--config")
        .arg(dir.path().join("missing.json"))
        .arg("--root")
        .arg(dir.path().join("content"))
        .arg("--template-dir")
        .arg(&templates)
        .arg("")
        .assert()
        .failure();
}
