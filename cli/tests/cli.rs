//! End-to-end runs of the `mkninja` binary against scripts on disk.

use std::fs;
use std::path::Path;

use predicates::prelude::*;
use tempfile::TempDir;

fn mkninja_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("mkninja"))
}

fn write_script(dir: &Path, contents: &str) {
    fs::write(dir.join("mkninja.build"), contents).unwrap();
}

#[test]
fn generates_build_file_in_working_directory() {
    let src = TempDir::new().unwrap();
    let bld = TempDir::new().unwrap();
    write_script(
        src.path(),
        "add_target(command: 'echo hi > out.txt', outputs: [BLD / 'out.txt'])\n",
    );

    mkninja_cmd()
        .current_dir(bld.path())
        .arg(src.path())
        .args(["--manifest", "/opt/manifest", "--findglob", "/opt/findglob", "--stamp", "/opt/stamp"])
        .assert()
        .success();

    let ninja = fs::read_to_string(bld.path().join("build.ninja")).unwrap();
    assert!(ninja.starts_with("# global path variables\nBLD="));
    assert!(ninja.contains("build out.txt: TARGET | ||\n CMD = echo hi > out.txt\n"));
    assert!(ninja.contains(" command = cd $WORKDIR && $CMD && /opt/stamp $STAMP\n"));
    assert!(ninja.contains("build build.ninja: TARGET .rerun_mkninja.sh "));
    assert!(ninja.ends_with("default all\n"));

    let rerun = fs::read_to_string(bld.path().join(".rerun_mkninja.sh")).unwrap();
    assert!(rerun.starts_with("#!/bin/sh\n"));
    assert!(rerun.contains("--stamp /opt/stamp"));
}

#[test]
fn script_output_goes_to_stdout() {
    let src = TempDir::new().unwrap();
    let bld = TempDir::new().unwrap();
    write_script(src.path(), "message('hello from', mkninja.namespace())\n");

    mkninja_cmd()
        .current_dir(bld.path())
        .arg(src.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("hello from root"));
}

#[test]
fn failed_configuration_writes_nothing() {
    let src = TempDir::new().unwrap();
    let bld = TempDir::new().unwrap();
    write_script(src.path(), "x = 1\nerror('boom')\n");

    mkninja_cmd()
        .current_dir(bld.path())
        .arg(src.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("boom"));

    assert!(!bld.path().join("build.ninja").exists());
    assert!(!bld.path().join(".rerun_mkninja.sh").exists());
}

#[test]
fn missing_root_script_is_reported() {
    let src = TempDir::new().unwrap();
    let bld = TempDir::new().unwrap();

    mkninja_cmd()
        .current_dir(bld.path())
        .arg(src.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("mkninja.build"));
}

#[test]
fn prints_version() {
    mkninja_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
