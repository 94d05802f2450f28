//! End-to-end tests driving the built binary directly, in the teacher's
//! `assert_cmd` style (see the old `tests/test_run.rs` this replaces).
//! These cover the argv-intake and composition error paths that surface
//! before any JVM library would need to be loaded; actually booting a JVM
//! is out of scope for a hermetic test environment.

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn hashdot() -> Command {
    Command::cargo_bin("hashdot").unwrap()
}

#[test]
fn test_missing_script_argument_is_config_error() {
    let profile_dir = TempDir::new().unwrap();
    fs::write(profile_dir.path().join("default.hdp"), "").unwrap();

    hashdot()
        .env("HASHDOT_PROFILE_DIR", profile_dir.path())
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_missing_default_profile_is_profile_not_found() {
    let profile_dir = TempDir::new().unwrap();
    let script_dir = TempDir::new().unwrap();
    let script = script_dir.path().join("script.x");
    fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();

    hashdot()
        .env("HASHDOT_PROFILE_DIR", profile_dir.path())
        .arg(&script)
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_parse_error_in_profile_is_reported() {
    let profile_dir = TempDir::new().unwrap();
    // "x" with no operator is an IncompleteExpression parse error.
    fs::write(profile_dir.path().join("default.hdp"), "x\n").unwrap();

    let script_dir = TempDir::new().unwrap();
    let script = script_dir.path().join("script.x");
    fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();

    hashdot()
        .env("HASHDOT_PROFILE_DIR", profile_dir.path())
        .arg(&script)
        .assert()
        .failure()
        .code(11);
}

#[test]
fn test_script_header_directive_is_applied_before_vm_bootstrap_failure() {
    // With a valid default profile and header but no real JVM library
    // available in the test environment, the pipeline should get as far as
    // VM bootstrap (exit code 5) rather than failing composition.
    let profile_dir = TempDir::new().unwrap();
    fs::write(
        profile_dir.path().join("default.hdp"),
        "hashdot.main = com.example.Main\n",
    )
    .unwrap();

    let script_dir = TempDir::new().unwrap();
    let script = script_dir.path().join("script.x");
    fs::write(&script, "#!/bin/sh\n#. hashdot.vm.options = -ea\necho hi\n").unwrap();

    let assert = hashdot()
        .env("HASHDOT_PROFILE_DIR", profile_dir.path())
        .arg(&script)
        .assert()
        .failure();
    let code = assert.get_output().status.code().unwrap();
    assert!(code == 5 || code == 6, "unexpected exit code {code}");
}
