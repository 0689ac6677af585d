//! Error reporting tests.

use crate::support::*;

#[test]
fn test_missing_project_config() {
    let t = Test::new();

    let output = t.cmd().args(["credentials", "pull"]).output().unwrap();
    assert_failure(&output);
    assert_error_contains(&output, "project config not found");
}

#[test]
fn test_invalid_project_name() {
    let t = Test::new();
    t.write_config("[project]\ngroup = \"acme\"\nname = \"a/b\"\n");

    let output = t.info();
    assert_failure(&output);
    assert_error_contains(&output, "may not contain '/'");
}

#[test]
fn test_unknown_driver() {
    let t = Test::new();
    t.write_config("[project]\ngroup = \"acme\"\nname = \"api\"\n\n[credentials]\ndriver = \"ftp\"\n");

    let output = t.info();
    assert_failure(&output);
    assert_error_contains(&output, "unknown credentials driver: ftp");
}

#[test]
fn test_unreachable_store() {
    let t = Test::new();
    let missing = t.home.path().join("nowhere");
    t.write_config(&project_toml(&format!("file://{}", missing.display()), &["test"]));

    let output = t.cmd().args(["credentials", "get", "test"]).output().unwrap();
    assert_failure(&output);
}

#[test]
fn test_completions_generate() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "bash"]).output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "bullpen");
}
