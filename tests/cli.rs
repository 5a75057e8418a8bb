// End-to-end runs of the binary with /bin/sh standing in for the interpreter.
#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_pair(dir: &Path, stem: &str, program: &str, expected: &str) {
    fs::write(dir.join(format!("{stem}.bite")), program).unwrap();
    fs::write(dir.join(format!("{stem}.expected")), expected).unwrap();
}

fn harness(root: &Path, logs: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bite-test").unwrap();
    cmd.arg(root)
        .arg("--bite-path")
        .arg("/bin/sh")
        .arg("--timeout")
        .arg("2")
        .arg("--log-dir")
        .arg(logs)
        .arg("--no-color");
    cmd
}

#[test]
fn passing_suite_exits_zero() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("tests");
    fs::create_dir_all(root.join("nested")).unwrap();
    write_pair(&root, "hello", "echo hello\n", "hello\n");
    write_pair(&root.join("nested"), "sum", "echo $((1 + 2))\n", "3");

    harness(&root, &dir.path().join("logs"))
        .assert()
        .success()
        .stdout(contains("[OK] hello"))
        .stdout(contains("Total: 2, Passed: 2, Failed: 0"))
        .stdout(contains("See ").not());
}

#[test]
fn failures_exit_nonzero_and_point_at_the_log() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("tests");
    let logs = dir.path().join("logs");
    fs::create_dir_all(&root).unwrap();
    write_pair(&root, "a_good", "echo ok\n", "ok");
    write_pair(&root, "b_bad", "echo nope\n", "yes");
    write_pair(&root, "c_err", "echo ok\necho boom >&2\n", "ok");

    harness(&root, &logs)
        .assert()
        .code(1)
        .stdout(contains("[FAIL] b_bad (output mismatch)"))
        .stdout(contains("[FAIL] c_err (runtime error)"))
        .stdout(contains("Total: 3, Passed: 1, Failed: 2"))
        .stdout(contains("test_log_"));

    let entries: Vec<_> = fs::read_dir(&logs).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let log = fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
    assert!(log.contains("expected:\nyes\nactual:\nnope\n"));
    assert!(log.contains("stderr:\nboom\n"));
}

#[test]
fn silent_mode_prints_only_the_summary() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("tests");
    fs::create_dir_all(&root).unwrap();
    write_pair(&root, "bad", "echo nope\n", "yes");

    harness(&root, &dir.path().join("logs"))
        .arg("--silent")
        .assert()
        .code(1)
        .stdout(contains("[FAIL]").not())
        .stdout(contains("Total: 1, Passed: 0, Failed: 1"));
}

#[test]
fn missing_root_is_a_fatal_error() {
    let dir = tempdir().unwrap();
    harness(&dir.path().join("absent"), &dir.path().join("logs"))
        .assert()
        .code(2)
        .stderr(contains("does not exist"));
}
